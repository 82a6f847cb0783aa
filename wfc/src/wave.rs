use coord_2d::{Coord, Size};
use grid_2d::Grid;

use crate::grid3::Grid3;
use crate::pattern::PatternId;

/// The solver state: which patterns remain possible at each output cell, plus
/// the dirty mask consumed by the propagators. Possibilities only ever go
/// from `true` to `false` within a solve.
#[derive(Debug, Clone)]
pub struct Wave {
    possible: Grid3<bool>,
    changes: Grid<bool>,
}

impl Wave {
    pub fn new(size: Size, num_patterns: usize) -> Self {
        Self {
            possible: Grid3::new_clone(size, num_patterns, true),
            changes: Grid::new_clone(size, false),
        }
    }

    pub fn size(&self) -> Size {
        self.possible.size()
    }

    pub fn num_patterns(&self) -> usize {
        self.possible.depth()
    }

    pub fn possible(&self, coord: Coord, pattern_id: PatternId) -> bool {
        *self.possible.get_checked(coord, pattern_id as usize)
    }

    pub(crate) fn set_possible(&mut self, coord: Coord, pattern_id: PatternId, possible: bool) {
        self.possible.set(coord, pattern_id as usize, possible);
    }

    pub(crate) fn is_dirty(&self, coord: Coord) -> bool {
        *self.changes.get_checked(coord)
    }

    pub(crate) fn set_dirty(&mut self, coord: Coord, dirty: bool) {
        *self.changes.get_checked_mut(coord) = dirty;
    }

    /// The single remaining pattern at `coord`, if the cell is decided.
    pub fn decided_pattern(&self, coord: Coord) -> Option<PatternId> {
        let mut decided = None;
        for pattern_id in 0..self.num_patterns() as PatternId {
            if self.possible(coord, pattern_id) {
                if decided.is_some() {
                    return None;
                }
                decided = Some(pattern_id);
            }
        }
        decided
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_fully_undecided() {
        let wave = Wave::new(Size::new(3, 2), 4);
        for x in 0..3 {
            for y in 0..2 {
                let coord = Coord::new(x, y);
                assert!(!wave.is_dirty(coord));
                for t in 0..4 {
                    assert!(wave.possible(coord, t));
                }
                assert_eq!(wave.decided_pattern(coord), None);
            }
        }
    }

    #[test]
    fn decided_pattern() {
        let mut wave = Wave::new(Size::new(1, 1), 3);
        let coord = Coord::new(0, 0);
        wave.set_possible(coord, 0, false);
        assert_eq!(wave.decided_pattern(coord), None);
        wave.set_possible(coord, 2, false);
        assert_eq!(wave.decided_pattern(coord), Some(1));
        wave.set_possible(coord, 1, false);
        assert_eq!(wave.decided_pattern(coord), None);
    }
}
