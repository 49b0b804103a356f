//! The OpenEXR reader.
//!
//! [`OpenExrInput`] presents scanline and tiled EXR files, including mip and
//! rip pyramids and environment maps, through the [`ImageInput`] interface.
//! Every channel is delivered as half float in native byte order, in the
//! canonical order worked out by [`ChannelMap`].
//!
//! # Example
//!
//! ```rust,no_run
//! use imageio::ImageInput;
//! use imageio_openexr::OpenExrInput;
//! use std::path::Path;
//!
//! let mut input = OpenExrInput::new().with_pedantic(true);
//! let spec = input.open(Path::new("beauty.exr"))?;
//! let mut row = vec![0u8; spec.scanline_bytes()];
//! for y in spec.y..spec.y + spec.height as i32 {
//!     input.read_native_scanline(y, 0, &mut row)?;
//! }
//! # Ok::<(), imageio::IoError>(())
//! ```
//!
//! # Coordinates
//!
//! Callers address rows and tiles in spec coordinates: `spec.y` is the first
//! row of the data window. The decoder works relative to the data-window
//! origin of the current level; [`FrameBuffer`] bridges the two.
//!
//! The offset table is read once at open. Each read seeks straight to the
//! chunk that holds the requested row or tile; the last decompressed block
//! is kept for the next read.
//!
//! # Errors
//!
//! Decoder failures are recorded in the reader's error sink as
//! `"OpenEXR exception: ..."` (open) or `"Failed OpenEXR read: ..."` (read)
//! and drained by [`ImageInput::geterror`]. Files that are not EXR, out of
//! range subimages and misuse (wrong read mode, bad region, short buffer)
//! return an error without recording anything.

use crate::attrs;
use crate::channels::ChannelMap;
use crate::chunks::ChunkIndex;
use crate::decode_error;
use crate::detect::{self, ExrPreamble};
use crate::framebuffer::{FrameBuffer, Window};
use crate::header::HeaderInfo;
use exr::block::UncompressedBlock;
use exr::block::chunk::Chunk;
use exr::meta::header::Header;
use exr::meta::{BlockDescription, MetaData};
use imageio::{ErrorSink, FormatSpec, ImageInput, IoError, IoResult};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

/// Stable format identifier.
pub const FORMAT_NAME: &str = "OpenEXR";

/// Reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExrInputConfig {
    /// Reject slightly malformed files instead of reading what is readable.
    pub pedantic: bool,
}

/// An open file, its parsed meta data and the last decoded block.
#[derive(Debug)]
struct ExrFile {
    file: File,
    meta: MetaData,
    chunks: ChunkIndex,
    cached: Option<(usize, UncompressedBlock)>,
}

impl ExrFile {
    fn open(path: &Path, pedantic: bool) -> IoResult<Self> {
        let file = File::open(path)?;
        let (meta, chunks) = ChunkIndex::read(&file, pedantic)?;
        Ok(Self {
            file,
            meta,
            chunks,
            cached: None,
        })
    }

    fn header(&self) -> &Header {
        &self.meta.headers[0]
    }

    /// Reads and decompresses one chunk of part 0.
    fn read_block(&self, chunk: usize, pedantic: bool) -> IoResult<UncompressedBlock> {
        let (Some(offset), Some(expected)) = (self.chunks.offset(chunk), self.chunks.block(chunk))
        else {
            return Err(IoError::DecodeError(format!("chunk {chunk} is not in the offset table")));
        };

        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(offset))?;
        let compressed = Chunk::read(&mut reader, &self.meta).map_err(decode_error)?;
        if compressed.layer_index != 0 {
            return Err(IoError::DecodeError(format!(
                "chunk {chunk} belongs to part {}",
                compressed.layer_index
            )));
        }

        let block =
            UncompressedBlock::decompress_chunk(compressed, &self.meta, pedantic).map_err(decode_error)?;
        if block.index.level != expected.level || block.index.pixel_position != expected.pixel_position {
            return Err(IoError::DecodeError(format!(
                "chunk {chunk} does not hold the block its offset table entry names"
            )));
        }
        Ok(block)
    }

    /// Decodes `chunk` into `data` through `framebuffer`.
    ///
    /// The last decompressed block is kept, so consecutive scanlines of one
    /// block decompress it once.
    fn decode(
        &mut self,
        chunk: usize,
        pedantic: bool,
        framebuffer: &FrameBuffer,
        data: &mut [u8],
    ) -> IoResult<()> {
        if self.cached.as_ref().map(|(cached, _)| *cached) != Some(chunk) {
            self.cached = None;
            let block = self.read_block(chunk, pedantic)?;
            self.cached = Some((chunk, block));
        }

        let Some((_, block)) = &self.cached else {
            return Ok(());
        };
        for line in block.lines(&self.header().channels) {
            framebuffer.write_line(data, &line)?;
        }
        Ok(())
    }
}

/// The live decoder handle: scanline or tiled, never both.
#[derive(Debug)]
enum Handle {
    Scanline(ExrFile),
    Tiled(ExrFile),
}

impl Handle {
    fn file(&self) -> &ExrFile {
        match self {
            Self::Scanline(file) | Self::Tiled(file) => file,
        }
    }
}

/// State that exists only while a file is open.
#[derive(Debug)]
struct OpenFile {
    handle: Handle,
    info: HeaderInfo,
    channels: ChannelMap,
    level: (usize, usize),
}

/// OpenEXR image input.
#[derive(Debug)]
pub struct OpenExrInput {
    config: ExrInputConfig,
    open: Option<OpenFile>,
    spec: FormatSpec,
    subimage: i32,
    errors: ErrorSink,
}

impl OpenExrInput {
    /// Creates a closed reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(ExrInputConfig::default())
    }

    /// Creates a closed reader with the given configuration.
    pub fn with_config(config: ExrInputConfig) -> Self {
        Self {
            config,
            open: None,
            spec: FormatSpec::default(),
            subimage: -1,
            errors: ErrorSink::new(),
        }
    }

    /// Sets pedantic validation.
    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.config.pedantic = pedantic;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ExrInputConfig {
        &self.config
    }

    /// Returns `true` while a file is open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Returns `true` if the open file is tiled.
    pub fn is_tiled(&self) -> bool {
        matches!(
            self.open.as_ref().map(|open| &open.handle),
            Some(Handle::Tiled(_))
        )
    }

    /// Typed header of the part being read.
    pub fn header(&self) -> Option<&Header> {
        self.open.as_ref().map(|open| open.handle.file().header())
    }

    /// Number of parts in the open file.
    pub fn part_count(&self) -> usize {
        self.open
            .as_ref()
            .map_or(0, |open| open.handle.file().meta.headers.len())
    }

    /// Channel mapping of the open file, including stored sample types.
    pub fn channel_map(&self) -> Option<&ChannelMap> {
        self.open.as_ref().map(|open| &open.channels)
    }

    /// Decoder level `(lx, ly)` of the current subimage.
    pub fn level(&self) -> Option<(usize, usize)> {
        self.open.as_ref().map(|open| open.level)
    }

    fn load(&self, path: &Path, sniff: ExrPreamble) -> IoResult<OpenFile> {
        if sniff.deep {
            return Err(IoError::UnsupportedOperation("deep data is not supported".into()));
        }

        let exr_file = ExrFile::open(path, self.config.pedantic)?;
        let header = exr_file
            .meta
            .headers
            .first()
            .ok_or_else(|| IoError::DecodeError("file has no parts".into()))?;
        if header.deep {
            return Err(IoError::UnsupportedOperation("deep data is not supported".into()));
        }

        let mut reader = BufReader::new(&exr_file.file);
        reader.seek(SeekFrom::Start(0))?;
        let attributes = attrs::read_header_attributes(reader)?;

        let mut info = HeaderInfo::build(header, &attributes);
        let channels = ChannelMap::from_channel_list(&header.channels);
        channels.apply(&mut info.spec);
        for (name, sample_type) in channels.narrowed() {
            tracing::warn!(channel = name, "{sample_type:?} samples are narrowed to half");
        }

        let tiled = sniff.tiled
            || (sniff.multipart && matches!(header.blocks, BlockDescription::Tiles(_)));
        let handle = if tiled {
            Handle::Tiled(exr_file)
        } else {
            Handle::Scanline(exr_file)
        };

        Ok(OpenFile {
            handle,
            info,
            channels,
            level: (0, 0),
        })
    }
}

impl Default for OpenExrInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Text for the error sink: the bare detail, without the variant prefix.
fn detail(err: &IoError) -> String {
    match err {
        IoError::DecodeError(detail)
        | IoError::UnsupportedOperation(detail)
        | IoError::UnsupportedFormat(detail)
        | IoError::InvalidRegion(detail) => detail.clone(),
        other => other.to_string(),
    }
}

fn check_buffer(needed: usize, data: &[u8]) -> IoResult<()> {
    if data.len() < needed {
        return Err(IoError::BufferTooSmall {
            needed,
            actual: data.len(),
        });
    }
    Ok(())
}

impl ImageInput for OpenExrInput {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn valid_file(&self, path: &Path) -> bool {
        detect::valid_file(path)
    }

    fn open(&mut self, path: &Path) -> IoResult<FormatSpec> {
        let Some(sniff) = ExrPreamble::from_path(path)? else {
            return Err(IoError::UnsupportedFormat(format!(
                "{} is not an OpenEXR file",
                path.display()
            )));
        };

        self.close()?;
        let open = match self.load(path, sniff) {
            Ok(open) => open,
            Err(err) => {
                self.errors.push(format!("OpenEXR exception: {}", detail(&err)));
                return Err(err);
            }
        };

        tracing::debug!(
            path = %path.display(),
            tiled = matches!(open.handle, Handle::Tiled(_)),
            width = open.info.spec.width,
            height = open.info.spec.height,
            channels = open.info.spec.nchannels,
            subimages = open.info.levels.nsubimages(),
            "opened OpenEXR file"
        );

        self.spec = open.info.spec.clone();
        self.subimage = 0;
        self.open = Some(open);
        Ok(self.spec.clone())
    }

    fn close(&mut self) -> IoResult<()> {
        self.open = None;
        self.spec = FormatSpec::default();
        self.subimage = -1;
        Ok(())
    }

    fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    fn nsubimages(&self) -> usize {
        self.open
            .as_ref()
            .map_or(0, |open| open.info.levels.nsubimages())
    }

    fn current_subimage(&self) -> i32 {
        self.subimage
    }

    fn seek_subimage(&mut self, index: i32) -> IoResult<FormatSpec> {
        let open = self.open.as_mut().ok_or(IoError::NotOpen)?;
        let count = open.info.levels.nsubimages();
        let out_of_range = IoError::SubimageOutOfRange { index, count };

        let Ok(subimage) = usize::try_from(index) else {
            return Err(out_of_range);
        };
        let (Some(spec), Some(level)) = (
            open.info.subimage_spec(subimage),
            open.info.levels.level_of(subimage),
        ) else {
            return Err(out_of_range);
        };

        tracing::debug!(subimage, width = spec.width, height = spec.height, "seek");
        open.level = level;
        self.subimage = index;
        self.spec = spec;
        Ok(self.spec.clone())
    }

    fn read_native_scanline(&mut self, y: i32, _z: i32, data: &mut [u8]) -> IoResult<()> {
        let open = self.open.as_mut().ok_or(IoError::NotOpen)?;
        let Handle::Scanline(file) = &mut open.handle else {
            return Err(IoError::UnsupportedOperation(
                "scanline read on a tiled file".into(),
            ));
        };

        let spec = &self.spec;
        let height = spec.height as i32;
        if y < spec.y || y >= spec.y + height {
            return Err(IoError::InvalidRegion(format!(
                "scanline {y} outside rows {}..{}",
                spec.y,
                spec.y + height
            )));
        }
        let row_bytes = spec.scanline_bytes();
        check_buffer(row_bytes, data)?;

        let row = (y - spec.y) as usize;
        let window = Window {
            x: 0..spec.width as usize,
            y: row..row + 1,
        };
        let framebuffer = FrameBuffer::for_channels(&open.channels, window, row_bytes);

        let result = file
            .chunks
            .scanline_chunk(row)
            .ok_or_else(|| IoError::DecodeError(format!("no chunk holds scanline {y}")))
            .and_then(|chunk| file.decode(chunk, self.config.pedantic, &framebuffer, data));

        result.inspect_err(|err| {
            self.errors.push(format!("Failed OpenEXR read: {}", detail(err)));
        })
    }

    fn read_native_tile(&mut self, x: i32, y: i32, _z: i32, data: &mut [u8]) -> IoResult<()> {
        let open = self.open.as_mut().ok_or(IoError::NotOpen)?;
        let Handle::Tiled(file) = &mut open.handle else {
            return Err(IoError::UnsupportedOperation(
                "tile read on a scanline file".into(),
            ));
        };

        let spec = &self.spec;
        let (tile_w, tile_h) = (spec.tile_width as usize, spec.tile_height as usize);
        let (width, height) = (spec.width as usize, spec.height as usize);
        let (Ok(tx), Ok(ty)) = (usize::try_from(x - spec.x), usize::try_from(y - spec.y)) else {
            return Err(IoError::InvalidRegion(format!("tile ({x}, {y}) before data window")));
        };
        if tx >= width || ty >= height {
            return Err(IoError::InvalidRegion(format!("tile ({x}, {y}) beyond data window")));
        }
        if tx % tile_w != 0 || ty % tile_h != 0 {
            return Err(IoError::InvalidRegion(format!(
                "tile ({x}, {y}) not on a {tile_w}x{tile_h} tile boundary"
            )));
        }
        check_buffer(spec.tile_bytes(), data)?;

        let window = Window {
            x: tx..(tx + tile_w).min(width),
            y: ty..(ty + tile_h).min(height),
        };
        let y_stride = tile_w * spec.pixel_bytes();
        let framebuffer = FrameBuffer::for_channels(&open.channels, window, y_stride);

        let (lx, ly) = open.level;
        let result = file
            .chunks
            .find((lx, ly), (tx, ty))
            .ok_or_else(|| {
                IoError::DecodeError(format!("no chunk holds tile ({x}, {y}) at level ({lx}, {ly})"))
            })
            .and_then(|chunk| file.decode(chunk, self.config.pedantic, &framebuffer, data));

        result.inspect_err(|err| {
            self.errors.push(format!("Failed OpenEXR read: {}", detail(err)));
        })
    }

    fn geterror(&mut self) -> String {
        self.errors.take()
    }
}
