//! Error types for image input operations.
//!
//! Every plugin reports failures through [`IoError`]; the text a caller sees
//! from [`ImageInput::geterror`](crate::ImageInput::geterror) is produced
//! separately by the plugin's [`ErrorSink`](crate::ErrorSink).

use std::io;
use thiserror::Error;

/// Image input error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not in a format this plugin reads.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The decoder rejected the file contents.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A read was attempted without an open file.
    #[error("no file is open")]
    NotOpen,

    /// Requested subimage does not exist.
    #[error("subimage {index} out of range (file has {count})")]
    SubimageOutOfRange {
        /// Requested index.
        index: i32,
        /// Number of subimages available.
        count: usize,
    },

    /// Unsupported operation (e.g. scanline read on a tiled file).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Requested row, tile or slice lies outside the image.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Destination buffer cannot hold the requested pixels.
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes provided.
        actual: usize,
    },
}

/// Result type for image input operations.
pub type IoResult<T> = Result<T, IoError>;
