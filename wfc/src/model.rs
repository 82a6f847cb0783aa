use coord_2d::{Coord, Size};

use crate::pattern::{PatternId, PatternTable};
use crate::wave::Wave;

/// The capability set the solver needs from a model. The two variants
/// (overlapping, tiled) differ only in how their propagator tables are built
/// and consulted; everything above this seam is shared.
pub trait Model {
    /// Output grid size.
    fn size(&self) -> Size;

    fn num_patterns(&self) -> usize;

    /// Prevalence of each pattern, used both for cell selection and for the
    /// collapse distribution.
    fn weights(&self) -> &PatternTable<f64>;

    fn periodic_out(&self) -> bool;

    /// Pattern pinned to the bottom row of the output, if any.
    fn foundation(&self) -> Option<PatternId> {
        None
    }

    /// Cells the observer must never collapse.
    fn on_boundary(&self, coord: Coord) -> bool;

    /// One elimination sweep over the dirty cells. Returns whether anything
    /// was eliminated; callers iterate to fixed point.
    fn propagate(&self, wave: &mut Wave) -> bool;
}
