//! EXR header attribute translation.
//!
//! Maps the attributes of an EXR header onto canonical metadata parameters.
//! A process-wide table classifies known attribute names:
//!
//! - **Rename**: the canonical key differs (`owner` becomes `copyright`)
//! - **Keep**: the EXR name already is the canonical key (`wrapmodes`)
//! - **Skip**: the spec builder or the decoder owns the attribute
//!
//! Names missing from the table are emitted with an `openexr_` prefix so they
//! cannot collide with canonical keys set elsewhere.
//!
//! # Example
//!
//! ```rust
//! use imageio_openexr::attrs::{canonical_name, Translation};
//!
//! assert_eq!(canonical_name("owner").as_deref(), Some("copyright"));
//! assert_eq!(canonical_name("screenWindowWidth").as_deref(), Some("openexr_screenWindowWidth"));
//! assert_eq!(canonical_name("dataWindow"), None);
//! ```
//!
//! Attribute values are read straight from the header bytes with the
//! decoder's attribute reader, so they arrive in file order and keep the
//! names the file uses.

use crate::decode_error;
use crate::detect::ExrPreamble;
use exr::io::PeekRead;
use exr::meta::attribute::{self, AttributeValue};
use imageio::{AttrValue, IoError, IoResult, ParamValue};
use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

/// Prefix for attributes without a canonical equivalent.
pub const PREFIX: &str = "openexr_";

/// How one EXR attribute name is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// Emit under a different canonical key.
    Rename(&'static str),
    /// Emit under the EXR name unchanged.
    Keep,
    /// Never emit.
    Skip,
}

/// Returns the process-wide translation table.
pub fn table() -> &'static HashMap<&'static str, Translation> {
    static TABLE: OnceLock<HashMap<&'static str, Translation>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use Translation::*;
        HashMap::from([
            ("cameraTransform", Rename("worldtocamera")),
            ("capDate", Rename("datetime")),
            ("comments", Rename("description")),
            ("owner", Rename("copyright")),
            ("pixelAspectRatio", Rename("pixelaspectratio")),
            ("wrapmodes", Keep),
            // owned by the spec builder
            ("channels", Skip),
            ("compression", Skip),
            ("dataWindow", Skip),
            ("envmap", Skip),
            ("tiledesc", Skip),
            ("tiles", Skip),
            // decoder bookkeeping
            ("lineOrder", Skip),
            ("type", Skip),
            ("chunkCount", Skip),
            ("version", Skip),
        ])
    })
}

/// Looks up how `exr_name` is treated.
///
/// Unlisted names get [`Translation::Rename`] semantics with a prefixed key,
/// which [`canonical_name`] produces.
pub fn lookup(exr_name: &str) -> Option<Translation> {
    table().get(exr_name).copied()
}

/// Canonical metadata key for an EXR attribute, `None` when it is skipped.
pub fn canonical_name(exr_name: &str) -> Option<String> {
    match lookup(exr_name) {
        Some(Translation::Rename(name)) => Some(name.to_string()),
        Some(Translation::Keep) => Some(exr_name.to_string()),
        Some(Translation::Skip) => None,
        None => Some(format!("{PREFIX}{exr_name}")),
    }
}

/// Converts an attribute value to a metadata value.
///
/// Returns `None` for value types that have no metadata representation.
pub fn convert_value(value: &AttributeValue) -> Option<AttrValue> {
    use AttributeValue as V;

    Some(match value {
        V::Text(text) => AttrValue::String(text.to_string()),
        V::I32(v) => AttrValue::Int(*v as i64),
        V::F32(v) => AttrValue::Float(*v as f64),
        V::F64(v) => AttrValue::Float(*v),
        V::Matrix4x4(m) => AttrValue::Matrix4(*m),
        V::Matrix3x3(m) => AttrValue::Matrix3(*m),
        V::IntVec2(v) => AttrValue::IntArray(vec![v.0 as i64, v.1 as i64]),
        V::FloatVec2(v) => AttrValue::FloatArray(vec![v.0 as f64, v.1 as f64]),
        V::IntVec3((x, y, z)) => AttrValue::IntArray(vec![*x as i64, *y as i64, *z as i64]),
        V::FloatVec3((x, y, z)) => AttrValue::FloatArray(vec![*x as f64, *y as f64, *z as f64]),
        V::IntegerBounds(bounds) => {
            let min = bounds.position;
            let max = bounds.max();
            AttrValue::IntArray(vec![min.0 as i64, min.1 as i64, max.0 as i64, max.1 as i64])
        }
        V::FloatRect(rect) => AttrValue::FloatArray(vec![
            rect.min.0 as f64,
            rect.min.1 as f64,
            rect.max.0 as f64,
            rect.max.1 as f64,
        ]),
        V::TextVector(texts) => AttrValue::StringArray(texts.iter().map(ToString::to_string).collect()),
        _ => return None,
    })
}

/// Translates one attribute into a metadata parameter.
///
/// Skipped names yield `None` silently; unsupported value types are logged
/// and yield `None`.
pub fn translate(exr_name: &str, value: &AttributeValue) -> Option<ParamValue> {
    let name = canonical_name(exr_name)?;
    match convert_value(value) {
        Some(value) => Some(ParamValue { name, value }),
        None => {
            let kind = String::from_utf8_lossy(value.kind_name());
            tracing::warn!("unknown attribute {kind} {exr_name}");
            None
        }
    }
}

/// Reads the attributes of the first header in file order.
///
/// `read` must be positioned at the start of the file. Attributes whose
/// value fails to decode are logged and left out.
pub fn read_header_attributes(read: impl Read) -> IoResult<Vec<(String, AttributeValue)>> {
    let mut read = PeekRead::new(read);

    let mut preamble = [0u8; 8];
    read.read_exact(&mut preamble)?;
    let flags = ExrPreamble::from_bytes(&preamble)
        .ok_or_else(|| IoError::UnsupportedFormat("missing OpenEXR magic number".into()))?;
    let max_name_len = if flags.long_names { 256 } else { 32 };

    let mut attributes = Vec::new();
    while !read.skip_if_eq(0)? {
        let (name, value) = attribute::read(&mut read, max_name_len).map_err(decode_error)?;
        let name = name.to_string();
        match value {
            Ok(value) => attributes.push((name, value)),
            Err(err) => tracing::warn!("skipping attribute {name}: {err}"),
        }
    }

    Ok(attributes)
}

/// Translates every attribute of a header, keeping file order.
pub fn translate_all(attributes: &[(String, AttributeValue)]) -> Vec<ParamValue> {
    attributes
        .iter()
        .filter_map(|(name, value)| translate(name, value))
        .collect()
}
