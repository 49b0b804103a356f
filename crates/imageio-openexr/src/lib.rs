//! # imageio-openexr
//!
//! OpenEXR image input plugin.
//!
//! Reads scanline and tiled EXR files through the [`imageio::ImageInput`]
//! interface. Mip and rip levels appear as subimages; cube-face and
//! latitude-longitude environment maps are flagged in the metadata.
//!
//! # Architecture
//!
//! ```text
//! detect ──> input::OpenExrInput ──> header (spec builder) ──> attrs (translator)
//!                  │                    └──> levels
//!                  ├──> chunks (offset table, block lookup)
//!                  ├──> channels (canonical order)
//!                  └──> framebuffer (back-offset slices, half conversion)
//! plugin: C entry points and the Rust descriptor
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use imageio::ImageInput;
//! use imageio_openexr::OpenExrInput;
//! use std::path::Path;
//!
//! let mut input = OpenExrInput::new();
//! let spec = input.open(Path::new("texture.exr"))?;
//! println!("{} subimages, {}", input.nsubimages(), spec);
//! let pixels = input.read_image()?;
//! # Ok::<(), imageio::IoError>(())
//! ```
//!
//! # Pixel Data
//!
//! Every channel is delivered as half float in native byte order. Float
//! channels are rounded to nearest, unsigned integer channels are clamped
//! at the largest finite half. [`ChannelMap::file_types`] keeps the stored
//! types.
//!
//! # Logging
//!
//! Uses the `tracing` facade and never installs a subscriber.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod attrs;
pub mod channels;
pub mod chunks;
pub mod detect;
pub mod framebuffer;
pub mod header;
pub mod input;
pub mod levels;
pub mod plugin;

pub use channels::ChannelMap;
pub use chunks::ChunkIndex;
pub use detect::{ExrPreamble, valid_file};
pub use input::{ExrInputConfig, FORMAT_NAME, OpenExrInput};
pub use levels::{LevelMode, Levels, Rounding};

use imageio::IoError;

/// Wraps a decoder error, keeping its message as the detail.
pub(crate) fn decode_error(err: exr::error::Error) -> IoError {
    IoError::DecodeError(err.to_string())
}
