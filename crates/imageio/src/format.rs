//! Pixel data formats.
//!
//! [`DataFormat`] is the storage type of one channel sample as it is handed
//! to callers of [`ImageInput`](crate::ImageInput). Plugins report it in
//! [`FormatSpec::format`](crate::FormatSpec::format) and size their buffers
//! with [`DataFormat::bytes_per_channel`].
//!
//! ```rust
//! use imageio::DataFormat;
//!
//! // EXR plugins hand out half-float samples
//! let format = DataFormat::F16;
//! assert_eq!(format.bytes_per_channel(), 2);
//! assert!(format.is_float());
//! ```

/// Runtime pixel data format.
///
/// Only byte-aligned types are represented; every sample of a given format
/// occupies exactly [`bytes_per_channel`](Self::bytes_per_channel) bytes in
/// native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    /// 8-bit unsigned integer.
    #[default]
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl DataFormat {
    /// Number of bytes per channel.
    #[inline]
    pub const fn bytes_per_channel(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Number of bits per channel.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::F16 => 16,
            Self::F32 => 32,
        }
    }

    /// Whether this is a floating-point format.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint",
            Self::F16 => "half",
            Self::F32 => "float",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_channel() {
        assert_eq!(DataFormat::U8.bytes_per_channel(), 1);
        assert_eq!(DataFormat::U16.bytes_per_channel(), 2);
        assert_eq!(DataFormat::U32.bytes_per_channel(), 4);
        assert_eq!(DataFormat::F16.bytes_per_channel(), 2);
        assert_eq!(DataFormat::F32.bytes_per_channel(), 4);
    }

    #[test]
    fn test_bits_match_bytes() {
        for format in [DataFormat::U8, DataFormat::U16, DataFormat::U32, DataFormat::F16, DataFormat::F32] {
            assert_eq!(format.bits() as usize, format.bytes_per_channel() * 8);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DataFormat::F16.to_string(), "half");
        assert!(!DataFormat::U32.is_float());
    }
}
