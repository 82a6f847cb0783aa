use thiserror::Error;

use crate::palette::MAX_COLORS;

/// Configuration problems detected while building a model. All of these are
/// fatal for the job that triggered them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("too many colors in sample image (more than {MAX_COLORS})")]
    PaletteOverflow,
    #[error("pattern size {n} out of range for {width}x{height} sample")]
    PatternTooLarge { n: u32, width: u32, height: u32 },
    #[error("symmetry must be within 1..=8, got {0}")]
    SymmetryOutOfRange(usize),
    #[error("palette of {palette_size} colors with {n}x{n} patterns overflows the 64-bit pattern hash")]
    HashOverflow { palette_size: usize, n: u32 },
    #[error("unknown symmetry class '{0}'")]
    UnknownSymmetry(String),
    #[error("unknown tile subset '{0}'")]
    UnknownSubset(String),
    #[error("neighbor declaration references unknown tile '{0}'")]
    UnknownTile(String),
    #[error("tile rotation index {0} out of range")]
    RotationOutOfRange(u32),
}
