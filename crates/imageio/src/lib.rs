//! # imageio
//!
//! The host-side contract shared by image input plugins.
//!
//! This crate provides the types a plugin fills in and the interface it implements:
//!
//! - [`FormatSpec`] - Image geometry, tiling, channel layout and metadata
//! - [`DataFormat`] - Storage type of one channel sample
//! - [`AttrValue`], [`ParamValue`] - Typed metadata parameters
//! - [`ImageInput`] - The reader interface, with a provided whole-image read
//! - [`ErrorSink`] - Pending error text of one reader
//! - [`IoError`] - Error type for every operation
//!
//! ## Crate Structure
//!
//! ```text
//! imageio (this crate)
//!    ^
//!    |
//!    +-- imageio-openexr (OpenEXR plugin)
//!    +-- imageio-info (command-line inspector)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod format;
pub mod input;
pub mod spec;

// Re-exports for convenience
pub use error::{IoError, IoResult};
pub use format::DataFormat;
pub use input::{ErrorSink, ImageInput};
pub use spec::{AttrValue, FormatSpec, ParamValue};
