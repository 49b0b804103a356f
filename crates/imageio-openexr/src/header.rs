//! Spec builder.
//!
//! Turns the typed header of the first part plus its raw attributes into a
//! [`FormatSpec`]. Channel layout is filled in separately by
//! [`ChannelMap::apply`](crate::channels::ChannelMap::apply).
//!
//! Metadata order is fixed: `textureformat`, `up`, `compression`, then the
//! translated header attributes in file order.

use crate::attrs;
use crate::levels::Levels;
use exr::compression::Compression;
use exr::meta::BlockDescription;
use exr::meta::attribute::{AttributeValue, EnvironmentMap};
use exr::meta::header::Header;
use imageio::{DataFormat, FormatSpec};

/// Environment map layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Envmap {
    /// Plain image.
    #[default]
    None,
    /// Latitude-longitude projection.
    LatLong,
    /// Six square cube faces stacked vertically.
    CubeFace,
}

impl Envmap {
    /// Finds the `envmap` attribute among raw header attributes.
    pub fn from_attributes(attributes: &[(String, AttributeValue)]) -> Self {
        attributes
            .iter()
            .find_map(|(name, value)| match (name.as_str(), value) {
                ("envmap", AttributeValue::EnvironmentMap(EnvironmentMap::LatitudeLongitude)) => {
                    Some(Self::LatLong)
                }
                ("envmap", AttributeValue::EnvironmentMap(EnvironmentMap::Cube)) => Some(Self::CubeFace),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Value of the `textureformat` parameter, if any.
    pub fn texture_format(self, tiled: bool) -> Option<&'static str> {
        match self {
            Self::CubeFace => Some("CubeFace Environment"),
            Self::LatLong => Some("LatLong Environment"),
            Self::None if tiled => Some("Plain Texture"),
            Self::None => None,
        }
    }
}

/// Canonical name of a compression method.
///
/// Both ZIP variants map to `"zip"`. Methods without a canonical name
/// yield `None` and emit no parameter.
pub fn compression_name(compression: &Compression) -> Option<&'static str> {
    Some(match compression {
        Compression::Uncompressed => "none",
        Compression::RLE => "rle",
        Compression::ZIP1 | Compression::ZIP16 => "zip",
        Compression::PIZ => "piz",
        Compression::PXR24 => "pxr24",
        Compression::B44 => "b44",
        Compression::B44A => "b44a",
        _ => return None,
    })
}

/// What the spec builder derives from a header.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    /// Spec of subimage 0, without channel layout.
    pub spec: FormatSpec,
    /// Level descriptor.
    pub levels: Levels,
    /// Environment map layout.
    pub envmap: Envmap,
}

impl HeaderInfo {
    /// Builds the level-0 spec.
    pub fn build(header: &Header, attributes: &[(String, AttributeValue)]) -> Self {
        let window = header.data_window();
        let width = window.size.x() as u32;
        let height = window.size.y() as u32;

        let mut spec = FormatSpec::new(width, height, 0, DataFormat::F16);
        spec.x = window.position.x();
        spec.y = window.position.y();
        spec.full_x = spec.x;
        spec.full_y = spec.y;
        spec.full_z = spec.z;

        let envmap = Envmap::from_attributes(attributes);
        if envmap == Envmap::CubeFace {
            spec.full_height = spec.width;
        }

        let tiled = match &header.blocks {
            BlockDescription::Tiles(tiles) => {
                spec.tile_width = tiles.tile_size.x() as u32;
                spec.tile_height = tiles.tile_size.y() as u32;
                true
            }
            BlockDescription::ScanLines => false,
        };
        spec.tile_depth = 0;

        if let Some(format) = envmap.texture_format(tiled) {
            spec.add_parameter("textureformat", format);
        }
        if envmap != Envmap::None {
            spec.add_parameter("up", "y");
        }
        if let Some(name) = compression_name(&header.compression) {
            spec.add_parameter("compression", name);
        }
        spec.extra_attribs.extend(attrs::translate_all(attributes));

        let levels = Levels::from_blocks(&header.blocks, width, height);
        Self { spec, levels, envmap }
    }

    /// Spec of subimage `index`, `None` when out of range.
    ///
    /// Only the resolution changes between subimages.
    pub fn subimage_spec(&self, index: usize) -> Option<FormatSpec> {
        let (width, height) = self.levels.resolution(index)?;
        let mut spec = self.spec.clone();
        if index == 0 {
            return Some(spec);
        }

        spec.width = width;
        spec.height = height;
        spec.full_width = width;
        spec.full_height = if self.envmap == Envmap::CubeFace {
            width
        } else {
            height
        };
        Some(spec)
    }
}
