//! Decoder-side framebuffer.
//!
//! The caller hands over a buffer that starts at the first pixel it wants,
//! the top-left of one scanline or one tile. The decoder produces lines
//! addressed relative to the data-window origin of the current level. The
//! framebuffer binds each file channel to a [`Slice`] whose origin is the
//! byte offset of decoder pixel `(0, 0)` relative to the caller buffer:
//!
//! ```text
//! origin(c) = user_index[c] * channel_bytes
//!           - x_first * pixel_bytes
//!           - y_first * y_stride
//! ```
//!
//! where `(x_first, y_first)` is the decoder position of the buffer's first
//! pixel. The origin is usually negative: it addresses a virtual pixel left
//! of and above the buffer. Every write goes through a bounds check and is
//! clipped to the requested window, so edge tiles and multi-line decoder
//! blocks never spill outside the caller's rows.
//!
//! Samples are stored as half floats in native byte order.

use crate::channels::ChannelMap;
use crate::decode_error;
use exr::block::lines::LineRef;
use exr::meta::attribute::SampleType;
use half::f16;
use imageio::{IoError, IoResult};
use smallvec::SmallVec;
use std::ops::Range;

/// Bytes of one delivered sample.
pub const SAMPLE_BYTES: usize = 2;

/// Pixels the caller asked for, in decoder coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Columns.
    pub x: Range<usize>,
    /// Rows.
    pub y: Range<usize>,
}

/// Where one file channel's samples land.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// File channel name.
    pub name: String,
    /// Stored sample type.
    pub sample_type: SampleType,
    /// Byte offset of decoder pixel `(0, 0)` relative to the caller buffer.
    pub origin: isize,
}

/// Channel bindings for one read.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixel_bytes: usize,
    y_stride: usize,
    first: (usize, usize),
    window: Window,
    slices: SmallVec<[Slice; 8]>,
}

impl FrameBuffer {
    /// Creates an empty framebuffer.
    ///
    /// The caller buffer starts at the first pixel of `window`; rows are
    /// `y_stride` bytes apart.
    pub fn new(window: Window, pixel_bytes: usize, y_stride: usize) -> Self {
        Self {
            pixel_bytes,
            y_stride,
            first: (window.x.start, window.y.start),
            window,
            slices: SmallVec::new(),
        }
    }

    /// Binds every file channel of `channels` at its canonical position.
    ///
    /// Slices are indexed like the file channel list.
    pub fn for_channels(channels: &ChannelMap, window: Window, y_stride: usize) -> Self {
        let pixel_bytes = channels.len() * SAMPLE_BYTES;
        let mut framebuffer = Self::new(window, pixel_bytes, y_stride);
        for (file_index, name) in channels.file_names.iter().enumerate() {
            framebuffer.insert(
                name,
                channels.file_types[file_index],
                channels.user_index[file_index],
            );
        }
        framebuffer
    }

    /// Appends a slice for the next file channel.
    pub fn insert(&mut self, name: &str, sample_type: SampleType, user_index: usize) {
        let (x_first, y_first) = self.first;
        let origin = (user_index * SAMPLE_BYTES) as isize
            - (x_first * self.pixel_bytes) as isize
            - (y_first * self.y_stride) as isize;
        self.slices.push(Slice {
            name: name.to_string(),
            sample_type,
            origin,
        });
    }

    /// Slice bound to file channel `index`.
    pub fn slice(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    /// Finds the slice bound to the file channel called `name`.
    pub fn find(&self, name: &str) -> Option<&Slice> {
        self.slices.iter().find(|slice| slice.name == name)
    }

    /// The requested window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Byte offset of sample `(x, y)` of `slice` in a buffer of `len` bytes.
    ///
    /// Returns `None` when the sample lies outside the buffer.
    pub fn offset(&self, slice: &Slice, x: usize, y: usize, len: usize) -> Option<usize> {
        let at = slice.origin
            + (x * self.pixel_bytes) as isize
            + (y * self.y_stride) as isize;
        usize::try_from(at)
            .ok()
            .filter(|&at| at + SAMPLE_BYTES <= len)
    }

    /// Stores one decoded line into `buf`, clipped to the window.
    pub fn write_line(&self, buf: &mut [u8], line: &LineRef<'_>) -> IoResult<()> {
        let location = line.location;
        let Some(slice) = self.slices.get(location.channel) else {
            return Ok(());
        };
        let y = location.position.y();
        if !self.window.y.contains(&y) {
            return Ok(());
        }
        let x = location.position.x();

        match slice.sample_type {
            SampleType::F16 => self.store(buf, slice, x, y, line.read_samples::<f16>()),
            SampleType::F32 => self.store(
                buf,
                slice,
                x,
                y,
                line.read_samples::<f32>().map(|s| s.map(f16::from_f32)),
            ),
            SampleType::U32 => self.store(
                buf,
                slice,
                x,
                y,
                line.read_samples::<u32>().map(|s| s.map(uint_to_half)),
            ),
        }
    }

    fn store(
        &self,
        buf: &mut [u8],
        slice: &Slice,
        x_start: usize,
        y: usize,
        samples: impl Iterator<Item = exr::error::Result<f16>>,
    ) -> IoResult<()> {
        for (i, sample) in samples.enumerate() {
            let x = x_start + i;
            if x >= self.window.x.end {
                break;
            }
            let sample = sample.map_err(decode_error)?;
            if x < self.window.x.start {
                continue;
            }

            let at = self
                .offset(slice, x, y, buf.len())
                .ok_or(IoError::BufferTooSmall {
                    needed: self.required_len(),
                    actual: buf.len(),
                })?;
            buf[at..at + SAMPLE_BYTES].copy_from_slice(&sample.to_ne_bytes());
        }
        Ok(())
    }

    /// Smallest caller buffer that holds every pixel of the window.
    pub fn required_len(&self) -> usize {
        let rows = self.window.y.len();
        let cols = self.window.x.len();
        if rows == 0 || cols == 0 {
            return 0;
        }
        (rows - 1) * self.y_stride + cols * self.pixel_bytes
    }
}

/// Converts an unsigned integer sample to half, clamping at the largest
/// finite half.
pub fn uint_to_half(value: u32) -> f16 {
    f16::from_f32((value as f32).min(f16::MAX.to_f32()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(x: Range<usize>, y: Range<usize>) -> Window {
        Window { x, y }
    }

    #[test]
    fn test_origin_scanline() {
        // 3 channels, scanline 10 of a 4 pixel wide image
        let mut fb = FrameBuffer::new(window(0..4, 10..11), 6, 24);
        fb.insert("B", SampleType::F16, 2);
        fb.insert("G", SampleType::F16, 1);
        fb.insert("R", SampleType::F16, 0);

        assert_eq!(fb.slice(0).unwrap().origin, 4 - 240);
        assert_eq!(fb.find("R").unwrap().origin, -240);

        // first pixel of the row lands at the buffer start
        let red = fb.find("R").unwrap();
        assert_eq!(fb.offset(red, 0, 10, 24), Some(0));
        assert_eq!(fb.offset(red, 3, 10, 24), Some(18));
        let blue = fb.slice(0).unwrap();
        assert_eq!(fb.offset(blue, 3, 10, 24), Some(22));

        // other rows fall outside the buffer
        assert_eq!(fb.offset(red, 0, 9, 24), None);
        assert_eq!(fb.offset(red, 0, 11, 24), None);
    }

    #[test]
    fn test_origin_tile() {
        // 1 channel, 2x2 tile at (4, 6), tile row stride 4 bytes
        let mut fb = FrameBuffer::new(window(4..6, 6..8), 2, 4);
        fb.insert("Y", SampleType::F16, 0);
        let y = fb.slice(0).unwrap();
        assert_eq!(y.origin, -(4 * 2) - (6 * 4));
        assert_eq!(fb.offset(y, 4, 6, 8), Some(0));
        assert_eq!(fb.offset(y, 5, 7, 8), Some(6));
        assert_eq!(fb.required_len(), 8);
    }

    #[test]
    fn test_for_channels_uses_user_index() {
        let channels = ChannelMap::resolve([
            ("B", SampleType::F16),
            ("G", SampleType::F16),
            ("R", SampleType::F32),
        ]);
        let fb = FrameBuffer::for_channels(&channels, window(0..2, 0..1), 12);
        let red = fb.find("R").unwrap();
        assert_eq!(red.sample_type, SampleType::F32);
        assert_eq!(fb.offset(red, 1, 0, 12), Some(6));
        assert_eq!(fb.offset(fb.find("B").unwrap(), 0, 0, 12), Some(4));
    }

    #[test]
    fn test_required_len() {
        let fb = FrameBuffer::new(window(0..8, 0..1), 8, 64);
        assert_eq!(fb.required_len(), 64);
        let fb = FrameBuffer::new(window(0..0, 0..1), 8, 64);
        assert_eq!(fb.required_len(), 0);
    }

    #[test]
    fn test_uint_to_half() {
        assert_eq!(uint_to_half(0), f16::ZERO);
        assert_eq!(uint_to_half(7), f16::from_f32(7.0));
        assert_eq!(uint_to_half(u32::MAX), f16::MAX);
        assert_eq!(uint_to_half(70_000), f16::MAX);
    }
}
