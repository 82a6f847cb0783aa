mod errors;
mod extract;
mod grid3;
mod model;
mod observe;
mod overlapping;
mod palette;
mod pattern;
pub mod retry;
mod run;
mod tiled;
mod wave;

pub use coord_2d::{Coord, Size};
pub use errors::Error;
pub use extract::{extract_patterns, Extraction, PatternPrevalence};
pub use grid3::Grid3;
pub use model::Model;
pub use observe::{observe, Outcome};
pub use overlapping::{Graphics, OverlappingModel};
pub use palette::{Palette, PalettedImage, Rgba, MAX_COLORS};
pub use pattern::{
    hash_from_pattern, make_pattern, pattern_from_hash, reflect, rotate, ColorIndex, Pattern,
    PatternHash, PatternId, PatternTable,
};
pub use run::{collapse, create_wave, run};
pub use tiled::{NeighborSpec, Symmetry, TileModel, TileOrientations, TileSet, TileSpec};
pub use wave::Wave;
