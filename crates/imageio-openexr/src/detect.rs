//! OpenEXR format sniffing.
//!
//! Looks at the 8-byte preamble only: the magic number, the version byte and
//! the feature flags. No header is parsed, so the check is cheap enough to run
//! on every candidate file before a reader is constructed.

use imageio::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// OpenEXR magic number: 0x76 0x2f 0x31 0x01.
pub const MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

const TILED_FLAG: u32 = 0x200;
const LONG_NAMES_FLAG: u32 = 0x400;
const DEEP_FLAG: u32 = 0x800;
const MULTIPART_FLAG: u32 = 0x1000;

/// What the preamble says about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExrPreamble {
    /// File format version (2 for every current file).
    pub version: u8,
    /// Single-part tiled file.
    pub tiled: bool,
    /// Attribute and channel names may exceed 31 bytes.
    pub long_names: bool,
    /// File contains deep (non-image) parts.
    pub deep: bool,
    /// File has more than one part.
    pub multipart: bool,
}

impl ExrPreamble {
    /// Decodes a preamble. Returns `None` if the magic number does not match.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 || bytes[0..4] != MAGIC {
            return None;
        }

        let word = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Some(Self {
            version: bytes[4],
            tiled: word & TILED_FLAG != 0,
            long_names: word & LONG_NAMES_FLAG != 0,
            deep: word & DEEP_FLAG != 0,
            multipart: word & MULTIPART_FLAG != 0,
        })
    }

    /// Reads and decodes the preamble of a file.
    ///
    /// Returns `Ok(None)` for files that are readable but not OpenEXR.
    pub fn from_path<P: AsRef<Path>>(path: P) -> IoResult<Option<Self>> {
        let mut file = File::open(path)?;
        let mut preamble = [0u8; 8];
        let mut filled = 0;
        while filled < preamble.len() {
            match file.read(&mut preamble[filled..])? {
                0 => return Ok(None),
                n => filled += n,
            }
        }
        Ok(Self::from_bytes(&preamble))
    }
}

/// Returns `true` if the header bytes start with the OpenEXR magic number.
pub fn can_read(header: &[u8]) -> bool {
    header.len() >= 4 && header[0..4] == MAGIC
}

/// Returns `true` if `path` names a readable OpenEXR file.
pub fn valid_file<P: AsRef<Path>>(path: P) -> bool {
    matches!(ExrPreamble::from_path(path), Ok(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanline_preamble() {
        let preamble = ExrPreamble::from_bytes(&[0x76, 0x2f, 0x31, 0x01, 0x02, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(preamble.version, 2);
        assert!(!preamble.tiled);
        assert!(!preamble.long_names);
        assert!(!preamble.deep);
        assert!(!preamble.multipart);
    }

    #[test]
    fn test_flag_bits() {
        // tiled + long names
        let preamble = ExrPreamble::from_bytes(&[0x76, 0x2f, 0x31, 0x01, 0x02, 0x06, 0x00, 0x00]).unwrap();
        assert!(preamble.tiled);
        assert!(preamble.long_names);

        // deep + multipart
        let preamble = ExrPreamble::from_bytes(&[0x76, 0x2f, 0x31, 0x01, 0x02, 0x18, 0x00, 0x00]).unwrap();
        assert!(!preamble.tiled);
        assert!(preamble.deep);
        assert!(preamble.multipart);
    }

    #[test]
    fn test_wrong_magic() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ExrPreamble::from_bytes(&png), None);
        assert_eq!(ExrPreamble::from_bytes(&MAGIC), None);
        assert!(!can_read(&png));
        assert!(can_read(&MAGIC));
    }

    #[test]
    fn test_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.exr");
        std::fs::write(&path, MAGIC).unwrap();
        assert_eq!(ExrPreamble::from_path(&path).unwrap(), None);
        assert!(!valid_file(&path));
        assert!(!valid_file(dir.path().join("missing.exr")));
    }
}
