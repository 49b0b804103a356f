//! Chunk lookup for the first part of a file.
//!
//! The offset table of part 0 is read once at open, together with the
//! block each chunk holds. Blocks are enumerated in offset table order, so
//! the position of a block in the index is its chunk number.

use crate::decode_error;
use exr::block::BlockIndex;
use exr::math::Vec2;
use exr::meta::MetaData;
use imageio::{IoError, IoResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

/// `(level, pixel position)` of a block, both relative to part 0.
type Key = ((usize, usize), (usize, usize));

fn key(level: Vec2<usize>, position: Vec2<usize>) -> Key {
    ((level.x(), level.y()), (position.x(), position.y()))
}

/// Where every block of part 0 lives in the file.
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    blocks: Vec<BlockIndex>,
    offsets: Vec<u64>,
    lookup: HashMap<Key, usize>,
}

impl ChunkIndex {
    /// Pairs blocks with their file offsets. Both are in chunk order.
    pub fn new(blocks: Vec<BlockIndex>, offsets: Vec<u64>) -> Self {
        let lookup = blocks
            .iter()
            .enumerate()
            .map(|(chunk, block)| (key(block.level, block.pixel_position), chunk))
            .collect();
        Self {
            blocks,
            offsets,
            lookup,
        }
    }

    /// Reads the meta data and the part 0 chunk index of `file`.
    pub fn read(file: &File, pedantic: bool) -> IoResult<(MetaData, Self)> {
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(0))?;
        let meta = MetaData::read_from_buffered(&mut reader, pedantic).map_err(decode_error)?;

        // part 0's table directly follows the headers
        let chunk_count = meta.headers.first().map_or(0, |header| header.chunk_count);
        let mut offsets = Vec::with_capacity(chunk_count);
        let mut word = [0u8; 8];
        for _ in 0..chunk_count {
            reader.read_exact(&mut word)?;
            offsets.push(u64::from_le_bytes(word));
        }

        reader.seek(SeekFrom::Start(0))?;
        let mut blocks = Vec::with_capacity(chunk_count);
        exr::block::read(reader, pedantic)
            .map_err(decode_error)?
            .filter_chunks(pedantic, |_, _, block| {
                if block.layer == 0 {
                    blocks.push(block);
                }
                false
            })
            .map_err(decode_error)?;

        if blocks.len() != offsets.len() {
            return Err(IoError::DecodeError(format!(
                "offset table lists {} chunks, header describes {}",
                offsets.len(),
                blocks.len()
            )));
        }
        Ok((meta, Self::new(blocks, offsets)))
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the part has no chunks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block held by `chunk`.
    pub fn block(&self, chunk: usize) -> Option<&BlockIndex> {
        self.blocks.get(chunk)
    }

    /// File offset of `chunk`.
    pub fn offset(&self, chunk: usize) -> Option<u64> {
        self.offsets.get(chunk).copied()
    }

    /// Chunk holding the block at `position` of level `(lx, ly)`.
    pub fn find(&self, level: (usize, usize), position: (usize, usize)) -> Option<usize> {
        self.lookup.get(&(level, position)).copied()
    }

    /// Chunk holding scanline `row` of level 0, relative to the data window.
    pub fn scanline_chunk(&self, row: usize) -> Option<usize> {
        // every block but the last spans the same number of rows
        let lines = self.blocks.first()?.pixel_size.y().max(1);
        self.find((0, 0), (0, row / lines * lines))
    }
}
