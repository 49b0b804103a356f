//! The image input interface.
//!
//! An [`ImageInput`] is one open file seen through a uniform, native-format
//! pixel stream. Format plugins implement the required methods; the trait
//! provides [`read_image`](ImageInput::read_image) on top of them.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──open()──> Open(subimage 0) ──seek_subimage(i)──> Open(subimage i)
//!   ^                    │
//!   └──────close()───────┘
//! ```
//!
//! # Error reporting
//!
//! Every operation returns an [`IoResult`]. Decoder failures are also
//! recorded as human-readable text in the reader's [`ErrorSink`], which the
//! host drains with [`ImageInput::geterror`].
//!
//! # Example
//!
//! ```rust,ignore
//! use imageio::ImageInput;
//! use imageio_openexr::OpenExrInput;
//!
//! let mut input = OpenExrInput::new();
//! let spec = input.open("beauty.exr".as_ref())?;
//! let mut row = vec![0u8; spec.scanline_bytes()];
//! input.read_native_scanline(spec.y, 0, &mut row)?;
//! ```

use crate::spec::FormatSpec;
use crate::{IoError, IoResult};
use std::path::Path;

/// Pending error messages of one reader.
///
/// Messages accumulate until [`take`](Self::take) drains them.
#[derive(Debug, Default, Clone)]
pub struct ErrorSink {
    messages: Vec<String>,
}

impl ErrorSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        self.messages.push(message);
    }

    /// Returns `true` if a message is pending.
    pub fn has_error(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns all pending messages joined by newlines and clears the sink.
    pub fn take(&mut self) -> String {
        let text = self.messages.join("\n");
        self.messages.clear();
        text
    }
}

/// A reader presenting one image file as native-format pixels.
///
/// Instances are single-threaded: calls on one reader are strictly ordered.
/// Distinct readers are independent and may live on different threads.
pub trait ImageInput: Send {
    /// Stable identifier of the format, e.g. `"OpenEXR"`.
    fn format_name(&self) -> &'static str;

    /// Returns `true` if `path` looks like a file this reader can open.
    fn valid_file(&self, path: &Path) -> bool;

    /// Opens a file and positions on subimage 0.
    ///
    /// Fails with [`IoError::UnsupportedFormat`] without recording an error
    /// message when the file is not in this reader's format.
    fn open(&mut self, path: &Path) -> IoResult<FormatSpec>;

    /// Releases the open file. Closing a closed reader is a no-op.
    fn close(&mut self) -> IoResult<()>;

    /// Spec of the current subimage (default spec while closed).
    fn spec(&self) -> &FormatSpec;

    /// Number of subimages in the open file, 0 while closed.
    fn nsubimages(&self) -> usize;

    /// Index of the current subimage, -1 while closed.
    fn current_subimage(&self) -> i32;

    /// Makes subimage `index` current and returns its spec.
    ///
    /// An out-of-range index fails and leaves the current subimage unchanged.
    fn seek_subimage(&mut self, index: i32) -> IoResult<FormatSpec>;

    /// Reads scanline `y` (in spec coordinates) into `data`.
    ///
    /// `data` must hold at least [`FormatSpec::scanline_bytes`].
    fn read_native_scanline(&mut self, y: i32, z: i32, data: &mut [u8]) -> IoResult<()>;

    /// Reads the tile whose top-left pixel is `(x, y)` into `data`.
    ///
    /// `data` must hold at least [`FormatSpec::tile_bytes`]; rows are
    /// `tile_width * pixel_bytes` apart.
    fn read_native_tile(&mut self, x: i32, y: i32, z: i32, data: &mut [u8]) -> IoResult<()>;

    /// Drains the pending error text.
    fn geterror(&mut self) -> String;

    /// Reads the whole current subimage into one contiguous buffer.
    ///
    /// Rows are [`FormatSpec::scanline_bytes`] apart. Tiled files are read
    /// tile by tile with partial edge tiles clipped.
    fn read_image(&mut self) -> IoResult<Vec<u8>> {
        let spec = self.spec().clone();
        if self.current_subimage() < 0 {
            return Err(IoError::NotOpen);
        }

        let row_bytes = spec.scanline_bytes();
        let mut image = vec![0u8; spec.image_bytes()];
        if image.is_empty() {
            return Ok(image);
        }

        if !spec.is_tiled() {
            for (row, chunk) in image.chunks_exact_mut(row_bytes).enumerate() {
                self.read_native_scanline(spec.y + row as i32, spec.z, chunk)?;
            }
            return Ok(image);
        }

        let tile_w = spec.tile_width as usize;
        let tile_h = spec.tile_height as usize;
        let pixel_bytes = spec.pixel_bytes();
        let tile_row_bytes = tile_w * pixel_bytes;
        let mut tile = vec![0u8; spec.tile_bytes()];

        for ty in (0..spec.height as usize).step_by(tile_h) {
            for tx in (0..spec.width as usize).step_by(tile_w) {
                self.read_native_tile(
                    spec.x + tx as i32,
                    spec.y + ty as i32,
                    spec.z,
                    &mut tile,
                )?;

                let cols = tile_w.min(spec.width as usize - tx);
                let rows = tile_h.min(spec.height as usize - ty);
                for r in 0..rows {
                    let src = &tile[r * tile_row_bytes..][..cols * pixel_bytes];
                    let dst = &mut image[(ty + r) * row_bytes + tx * pixel_bytes..][..cols * pixel_bytes];
                    dst.copy_from_slice(src);
                }
            }
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataFormat;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Single-channel 8-bit input whose pixel value is `x + 10 * y`.
    struct GradientInput {
        spec: FormatSpec,
        open: bool,
    }

    impl GradientInput {
        fn new(width: u32, height: u32, tile: u32) -> Self {
            let mut spec = FormatSpec::new(width, height, 1, DataFormat::U8);
            spec.x = -2;
            spec.y = 5;
            spec.tile_width = tile;
            spec.tile_height = tile;
            spec.channelnames = vec!["Y".into()];
            Self { spec, open: true }
        }

        fn value(&self, x: i32, y: i32) -> u8 {
            ((x - self.spec.x) + 10 * (y - self.spec.y)) as u8
        }
    }

    impl ImageInput for GradientInput {
        fn format_name(&self) -> &'static str {
            "gradient"
        }

        fn valid_file(&self, _path: &Path) -> bool {
            false
        }

        fn open(&mut self, _path: &Path) -> IoResult<FormatSpec> {
            Err(IoError::UnsupportedFormat("gradient".into()))
        }

        fn close(&mut self) -> IoResult<()> {
            self.open = false;
            Ok(())
        }

        fn spec(&self) -> &FormatSpec {
            &self.spec
        }

        fn nsubimages(&self) -> usize {
            usize::from(self.open)
        }

        fn current_subimage(&self) -> i32 {
            if self.open { 0 } else { -1 }
        }

        fn seek_subimage(&mut self, index: i32) -> IoResult<FormatSpec> {
            if index != 0 {
                return Err(IoError::SubimageOutOfRange { index, count: 1 });
            }
            Ok(self.spec.clone())
        }

        fn read_native_scanline(&mut self, y: i32, _z: i32, data: &mut [u8]) -> IoResult<()> {
            for (i, byte) in data.iter_mut().take(self.spec.width as usize).enumerate() {
                *byte = self.value(self.spec.x + i as i32, y);
            }
            Ok(())
        }

        fn read_native_tile(&mut self, x: i32, y: i32, _z: i32, data: &mut [u8]) -> IoResult<()> {
            let tile = self.spec.tile_width as usize;
            let right = self.spec.x + self.spec.width as i32;
            let bottom = self.spec.y + self.spec.height as i32;
            for r in 0..tile {
                for c in 0..tile {
                    let (px, py) = (x + c as i32, y + r as i32);
                    data[r * tile + c] = if px < right && py < bottom {
                        self.value(px, py)
                    } else {
                        0xff
                    };
                }
            }
            Ok(())
        }

        fn geterror(&mut self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_error_sink_take_clears() {
        let mut sink = ErrorSink::new();
        assert!(!sink.has_error());
        sink.push("first");
        sink.push("second");
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.take(), "first\nsecond");
        assert!(sink.is_empty());
        assert_eq!(sink.take(), "");
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_error_sink_stays_below_info() {
        // messages reach the host through geterror only
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut sink = ErrorSink::new();
            sink.push("Failed OpenEXR read: broken chunk");
            assert!(sink.has_error());
        });
        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_read_image_scanlines() {
        let mut input = GradientInput::new(4, 3, 0);
        let image = input.read_image().unwrap();
        assert_eq!(image.len(), 12);
        assert_eq!(&image[..4], &[0, 1, 2, 3]);
        assert_eq!(&image[8..], &[20, 21, 22, 23]);
    }

    #[test]
    fn test_read_image_clips_edge_tiles() {
        let mut input = GradientInput::new(5, 3, 2);
        let image = input.read_image().unwrap();
        assert_eq!(image.len(), 15);
        assert!(!image.contains(&0xff));
        assert_eq!(&image[10..], &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_read_image_closed() {
        let mut input = GradientInput::new(4, 4, 0);
        input.close().unwrap();
        assert!(matches!(input.read_image(), Err(IoError::NotOpen)));
    }
}
