//! Image format specification and metadata.
//!
//! This module provides [`FormatSpec`] - the description an
//! [`ImageInput`](crate::ImageInput) hands back from `open` and
//! `seek_subimage`: geometry, tiling, pixel format, channel layout and an
//! ordered list of typed metadata parameters.
//!
//! # Geometry
//!
//! ```text
//!  (full_x, full_y)
//!  ┌──────────────────────────────┐
//!  │        full (display)        │
//!  │   (x, y)                     │
//!  │   ┌───────────────────┐      │
//!  │   │   data window     │      │
//!  │   │  width x height   │      │
//!  │   └───────────────────┘      │
//!  └──────────────────────────────┘
//! ```
//!
//! Pixels exist only inside the data window. Rows are addressed as
//! `y ∈ [spec.y, spec.y + height)`.
//!
//! # Usage
//!
//! ```rust
//! use imageio::{DataFormat, FormatSpec};
//!
//! let mut spec = FormatSpec::new(64, 32, 4, DataFormat::F16);
//! spec.add_parameter("compression", "zip");
//!
//! assert_eq!(spec.pixel_bytes(), 8);
//! assert_eq!(spec.scanline_bytes(), 512);
//! assert_eq!(spec.get_string_attribute("compression"), Some("zip"));
//! ```
//!
//! # Used By
//!
//! - `imageio-openexr` - fills it from the EXR header
//! - `imageio-info` - prints it

use crate::format::DataFormat;

/// Attribute value that can be stored in image metadata.
///
/// Supports the value types image headers commonly carry.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Integer array (vectors, boxes)
    IntArray(Vec<i64>),
    /// Float array (vectors, boxes)
    FloatArray(Vec<f64>),
    /// String list
    StringArray(Vec<String>),
    /// 3x3 matrix (row-major)
    Matrix3([f32; 9]),
    /// 4x4 matrix (row-major)
    Matrix4([f32; 16]),
}

impl AttrValue {
    /// Returns this value as an integer, if applicable.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a float, if applicable.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string, if applicable.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the 4x4 matrix, if this is one.
    pub fn as_matrix4(&self) -> Option<&[f32; 16]> {
        match self {
            Self::Matrix4(m) => Some(m),
            _ => None,
        }
    }

    /// Short type name, e.g. `"int"` or `"matrix"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::IntArray(_) => "int[]",
            Self::FloatArray(_) => "float[]",
            Self::StringArray(_) => "string[]",
            Self::Matrix3(_) => "matrix33",
            Self::Matrix4(_) => "matrix",
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn list<T: std::fmt::Display>(f: &mut std::fmt::Formatter<'_>, items: &[T]) -> std::fmt::Result {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::IntArray(v) => list(f, v),
            Self::FloatArray(v) => list(f, v),
            Self::StringArray(v) => list(f, v),
            Self::Matrix3(m) => list(f, m),
            Self::Matrix4(m) => list(f, m),
        }
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<[f32; 16]> for AttrValue {
    fn from(v: [f32; 16]) -> Self {
        Self::Matrix4(v)
    }
}

/// A named metadata value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    /// Canonical metadata key
    pub name: String,
    /// Typed value
    pub value: AttrValue,
}

impl ParamValue {
    /// Creates a named parameter.
    pub fn new(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Description of an image (or one subimage of it).
///
/// Coordinates are signed because data windows may start left of or above
/// the origin. A `tile_width` of zero means the image is stored in scanlines.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    /// Origin of the data window
    pub x: i32,
    /// Origin of the data window
    pub y: i32,
    /// Origin of the data window (volumes only)
    pub z: i32,
    /// Data window width in pixels
    pub width: u32,
    /// Data window height in pixels
    pub height: u32,
    /// Data window depth (1 for 2D images)
    pub depth: u32,
    /// Origin of the full (display) image.
    ///
    /// Readers that have no separate display origin set the full origin to
    /// the data window origin. The OpenEXR reader does this.
    pub full_x: i32,
    /// Origin of the full (display) image, see [`full_x`](Self::full_x)
    pub full_y: i32,
    /// Origin of the full (display) image, see [`full_x`](Self::full_x)
    pub full_z: i32,
    /// Full image width
    pub full_width: u32,
    /// Full image height
    pub full_height: u32,
    /// Full image depth
    pub full_depth: u32,
    /// Tile width, 0 for scanline images
    pub tile_width: u32,
    /// Tile height, 0 for scanline images
    pub tile_height: u32,
    /// Tile depth, 0 for 2D tiles
    pub tile_depth: u32,
    /// Sample type of every channel
    pub format: DataFormat,
    /// Number of channels per pixel
    pub nchannels: usize,
    /// Channel names in pixel order
    pub channelnames: Vec<String>,
    /// Index of the alpha channel, `None` when there is none
    pub alpha_channel: Option<usize>,
    /// Index of the depth channel, `None` when there is none
    pub z_channel: Option<usize>,
    /// Additional metadata in insertion order
    pub extra_attribs: Vec<ParamValue>,
}

impl FormatSpec {
    /// Creates a spec for a `width` x `height` image at the origin.
    ///
    /// Full dimensions equal the data window; channels are unnamed.
    pub fn new(width: u32, height: u32, nchannels: usize, format: DataFormat) -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            width,
            height,
            depth: 1,
            full_x: 0,
            full_y: 0,
            full_z: 0,
            full_width: width,
            full_height: height,
            full_depth: 1,
            tile_width: 0,
            tile_height: 0,
            tile_depth: 0,
            format,
            nchannels,
            channelnames: Vec::new(),
            alpha_channel: None,
            z_channel: None,
            extra_attribs: Vec::new(),
        }
    }

    /// Bytes of one channel sample.
    #[inline]
    pub fn channel_bytes(&self) -> usize {
        self.format.bytes_per_channel()
    }

    /// Bytes of one pixel (all channels).
    #[inline]
    pub fn pixel_bytes(&self) -> usize {
        self.nchannels * self.channel_bytes()
    }

    /// Bytes of one scanline of the data window.
    #[inline]
    pub fn scanline_bytes(&self) -> usize {
        self.width as usize * self.pixel_bytes()
    }

    /// Pixels in one tile, 0 for scanline images.
    #[inline]
    pub fn tile_pixels(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize * self.tile_depth.max(1) as usize
    }

    /// Bytes of one tile, 0 for scanline images.
    #[inline]
    pub fn tile_bytes(&self) -> usize {
        self.tile_pixels() * self.pixel_bytes()
    }

    /// Pixels in the data window.
    #[inline]
    pub fn image_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth.max(1) as u64
    }

    /// Bytes of the whole data window.
    #[inline]
    pub fn image_bytes(&self) -> usize {
        self.image_pixels() as usize * self.pixel_bytes()
    }

    /// Returns `true` when pixels are stored in tiles.
    #[inline]
    pub fn is_tiled(&self) -> bool {
        self.tile_width != 0
    }

    /// Appends a metadata parameter, keeping any earlier one of the same name.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.extra_attribs.push(ParamValue::new(name, value));
    }

    /// Sets a metadata parameter, replacing an existing one of the same name.
    pub fn attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let param = ParamValue::new(name, value);
        match self.extra_attribs.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => self.extra_attribs.push(param),
        }
    }

    /// Finds the first parameter with the given name.
    pub fn find_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.extra_attribs
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Gets a parameter as a string.
    pub fn get_string_attribute(&self, name: &str) -> Option<&str> {
        self.find_attribute(name).and_then(AttrValue::as_str)
    }

    /// Gets a parameter as an integer.
    pub fn get_int_attribute(&self, name: &str) -> Option<i64> {
        self.find_attribute(name).and_then(AttrValue::as_int)
    }

    /// Gets a parameter as a float.
    pub fn get_float_attribute(&self, name: &str) -> Option<f64> {
        self.find_attribute(name).and_then(AttrValue::as_float)
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self::new(0, 0, 0, DataFormat::default())
    }
}

impl std::fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {} {}ch",
            self.width, self.height, self.format, self.nchannels
        )?;
        if self.is_tiled() {
            write!(f, " tile {}x{}", self.tile_width, self.tile_height)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_new() {
        let spec = FormatSpec::new(1920, 1080, 4, DataFormat::F16);
        assert_eq!((spec.x, spec.y, spec.z), (0, 0, 0));
        assert_eq!((spec.full_width, spec.full_height, spec.full_depth), (1920, 1080, 1));
        assert!(!spec.is_tiled());
        assert_eq!(spec.tile_bytes(), 0);
    }

    #[test]
    fn test_spec_bytes() {
        let mut spec = FormatSpec::new(100, 50, 3, DataFormat::F16);
        assert_eq!(spec.channel_bytes(), 2);
        assert_eq!(spec.pixel_bytes(), 6);
        assert_eq!(spec.scanline_bytes(), 600);
        assert_eq!(spec.image_bytes(), 30_000);

        spec.tile_width = 16;
        spec.tile_height = 8;
        assert!(spec.is_tiled());
        assert_eq!(spec.tile_pixels(), 128);
        assert_eq!(spec.tile_bytes(), 768);
    }

    #[test]
    fn test_parameters_keep_order() {
        let mut spec = FormatSpec::default();
        spec.add_parameter("textureformat", "Plain Texture");
        spec.add_parameter("compression", "zip");
        spec.add_parameter("openexr_screenWindowWidth", 1.0f32);

        let names: Vec<_> = spec.extra_attribs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["textureformat", "compression", "openexr_screenWindowWidth"]);
        assert_eq!(spec.get_float_attribute("openexr_screenWindowWidth"), Some(1.0));
        assert_eq!(spec.get_int_attribute("compression"), None);
    }

    #[test]
    fn test_attribute_replaces() {
        let mut spec = FormatSpec::default();
        spec.attribute("up", "y");
        spec.attribute("up", "z");
        assert_eq!(spec.extra_attribs.len(), 1);
        assert_eq!(spec.get_string_attribute("up"), Some("z"));
    }

    #[test]
    fn test_attr_value_display() {
        assert_eq!(AttrValue::from("zip").to_string(), "\"zip\"");
        assert_eq!(AttrValue::IntArray(vec![0, 0, 63, 31]).to_string(), "0, 0, 63, 31");
        assert_eq!(AttrValue::from(3).type_name(), "int");
    }
}
