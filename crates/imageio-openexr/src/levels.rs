//! Resolution levels.
//!
//! A tiled EXR file may carry a mip or rip pyramid. Each level is presented
//! as one subimage. Level sizes follow OpenEXR: every step halves a
//! dimension, rounding down or up, and never goes below one pixel.
//!
//! Rip pyramids have independent x and y levels. Subimage `i` maps to the
//! diagonal level `(min(i, nx - 1), min(i, ny - 1))`.
//!
//! # Example
//!
//! ```rust
//! use imageio_openexr::levels::{LevelMode, Levels, Rounding};
//!
//! let levels = Levels::new(LevelMode::MipMap, Rounding::Up, 5, 5);
//! assert_eq!(levels.nsubimages(), 4);
//! assert_eq!(levels.resolution(1), Some((3, 3)));
//! assert_eq!(levels.resolution(3), Some((1, 1)));
//! ```

use exr::meta::BlockDescription;

/// Level layout of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelMode {
    /// A single full-resolution level.
    #[default]
    One,
    /// Levels shrink in both dimensions together.
    MipMap,
    /// Levels shrink in each dimension independently.
    RipMap,
}

/// Rounding applied when halving an odd dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// `d / 2`
    #[default]
    Down,
    /// `d / 2 + 1` for odd `d`
    Up,
}

impl Rounding {
    /// Halves one dimension, saturating at 1.
    pub fn halve(self, size: u32) -> u32 {
        let half = match self {
            Self::Up if size % 2 == 1 => size / 2 + 1,
            _ => size / 2,
        };
        half.max(1)
    }

    /// `log2(size)`, floored or ceiled.
    fn log2(self, size: u32) -> u32 {
        let floor = size.max(1).ilog2();
        match self {
            Self::Up if !size.is_power_of_two() => floor + 1,
            _ => floor,
        }
    }

    /// Number of levels a pyramid over `size` pixels has.
    pub fn level_count(self, size: u32) -> usize {
        self.log2(size) as usize + 1
    }
}

/// Level descriptor of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    /// Level layout.
    pub mode: LevelMode,
    /// Halving rule.
    pub rounding: Rounding,
    /// Width of level 0.
    pub top_width: u32,
    /// Height of level 0.
    pub top_height: u32,
}

impl Levels {
    /// Creates a descriptor for a level-0 size of `top_width` x `top_height`.
    pub fn new(mode: LevelMode, rounding: Rounding, top_width: u32, top_height: u32) -> Self {
        Self {
            mode,
            rounding,
            top_width,
            top_height,
        }
    }

    /// Descriptor for a header's block layout. Scanline files have one level.
    pub fn from_blocks(blocks: &BlockDescription, top_width: u32, top_height: u32) -> Self {
        use exr::math::RoundingMode;
        use exr::meta::attribute::LevelMode as ExrLevelMode;

        let (mode, rounding) = match blocks {
            BlockDescription::ScanLines => (LevelMode::One, Rounding::Down),
            BlockDescription::Tiles(tiles) => {
                let mode = match tiles.level_mode {
                    ExrLevelMode::Singular => LevelMode::One,
                    ExrLevelMode::MipMap => LevelMode::MipMap,
                    ExrLevelMode::RipMap => LevelMode::RipMap,
                };
                let rounding = match tiles.rounding_mode {
                    RoundingMode::Down => Rounding::Down,
                    RoundingMode::Up => Rounding::Up,
                };
                (mode, rounding)
            }
        };
        Self::new(mode, rounding, top_width, top_height)
    }

    /// Number of x levels.
    pub fn x_levels(&self) -> usize {
        match self.mode {
            LevelMode::One => 1,
            LevelMode::MipMap => self.mip_levels(),
            LevelMode::RipMap => self.rounding.level_count(self.top_width),
        }
    }

    /// Number of y levels.
    pub fn y_levels(&self) -> usize {
        match self.mode {
            LevelMode::One => 1,
            LevelMode::MipMap => self.mip_levels(),
            LevelMode::RipMap => self.rounding.level_count(self.top_height),
        }
    }

    fn mip_levels(&self) -> usize {
        self.rounding
            .level_count(self.top_width.max(self.top_height))
    }

    /// Number of subimages presented to callers.
    ///
    /// For rip maps this is `max(x_levels, y_levels)`, so only the diagonal
    /// of the level grid is reachable.
    pub fn nsubimages(&self) -> usize {
        self.x_levels().max(self.y_levels())
    }

    /// Decoder level `(lx, ly)` backing subimage `index`.
    pub fn level_of(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.nsubimages() {
            return None;
        }
        Some(match self.mode {
            LevelMode::One => (0, 0),
            LevelMode::MipMap => (index, index),
            LevelMode::RipMap => (
                index.min(self.x_levels() - 1),
                index.min(self.y_levels() - 1),
            ),
        })
    }

    /// Size of one dimension at level `level`.
    fn level_size(&self, size: u32, level: usize) -> u32 {
        (0..level).fold(size, |d, _| self.rounding.halve(d))
    }

    /// Width and height of subimage `index`.
    pub fn resolution(&self, index: usize) -> Option<(u32, u32)> {
        let (lx, ly) = self.level_of(index)?;
        Some((
            self.level_size(self.top_width, lx),
            self.level_size(self.top_height, ly),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halve() {
        assert_eq!(Rounding::Down.halve(5), 2);
        assert_eq!(Rounding::Up.halve(5), 3);
        assert_eq!(Rounding::Up.halve(4), 2);
        assert_eq!(Rounding::Down.halve(1), 1);
        assert_eq!(Rounding::Up.halve(1), 1);
    }

    #[test]
    fn test_level_count() {
        assert_eq!(Rounding::Down.level_count(256), 9);
        assert_eq!(Rounding::Up.level_count(256), 9);
        assert_eq!(Rounding::Down.level_count(5), 3);
        assert_eq!(Rounding::Up.level_count(5), 4);
        assert_eq!(Rounding::Down.level_count(1), 1);
    }

    #[test]
    fn test_single_level() {
        let levels = Levels::new(LevelMode::One, Rounding::Down, 64, 32);
        assert_eq!(levels.nsubimages(), 1);
        assert_eq!(levels.resolution(0), Some((64, 32)));
        assert_eq!(levels.resolution(1), None);
    }

    #[test]
    fn test_mipmap_round_down() {
        let levels = Levels::new(LevelMode::MipMap, Rounding::Down, 256, 256);
        assert_eq!(levels.nsubimages(), 9);
        assert_eq!(levels.resolution(1), Some((128, 128)));
        assert_eq!(levels.resolution(3), Some((32, 32)));
        assert_eq!(levels.resolution(8), Some((1, 1)));
        assert_eq!(levels.resolution(9), None);
    }

    #[test]
    fn test_mipmap_round_up() {
        let levels = Levels::new(LevelMode::MipMap, Rounding::Up, 5, 5);
        assert_eq!(levels.nsubimages(), 4);
        assert_eq!(levels.resolution(1), Some((3, 3)));
        assert_eq!(levels.resolution(2), Some((2, 2)));
        assert_eq!(levels.resolution(3), Some((1, 1)));
    }

    #[test]
    fn test_mipmap_non_square_saturates() {
        let levels = Levels::new(LevelMode::MipMap, Rounding::Down, 16, 4);
        assert_eq!(levels.nsubimages(), 5);
        assert_eq!(levels.resolution(3), Some((2, 1)));
        assert_eq!(levels.resolution(4), Some((1, 1)));
    }

    #[test]
    fn test_each_level_halves_previous() {
        for rounding in [Rounding::Down, Rounding::Up] {
            let levels = Levels::new(LevelMode::MipMap, rounding, 37, 11);
            for k in 1..levels.nsubimages() {
                let (pw, ph) = levels.resolution(k - 1).unwrap();
                let (w, h) = levels.resolution(k).unwrap();
                assert_eq!(w, rounding.halve(pw));
                assert_eq!(h, rounding.halve(ph));
            }
        }
    }

    #[test]
    fn test_ripmap_diagonal() {
        let levels = Levels::new(LevelMode::RipMap, Rounding::Down, 16, 4);
        assert_eq!(levels.x_levels(), 5);
        assert_eq!(levels.y_levels(), 3);
        assert_eq!(levels.nsubimages(), 5);
        assert_eq!(levels.level_of(1), Some((1, 1)));
        assert_eq!(levels.level_of(4), Some((4, 2)));
        assert_eq!(levels.resolution(4), Some((1, 1)));
        assert_eq!(levels.resolution(2), Some((4, 1)));
    }
}
