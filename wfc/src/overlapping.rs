use coord_2d::{Coord, Size};
use grid_2d::Grid;
use log::info;

use crate::errors::Error;
use crate::extract::PatternPrevalence;
use crate::model::Model;
use crate::palette::Palette;
use crate::pattern::{
    pattern_from_hash, ColorIndex, Pattern, PatternHash, PatternId, PatternTable,
};
use crate::wave::Wave;

/// Per-cell lists of palette indices contributed by every pattern window
/// still overlapping the cell. The renderer averages them into pixels.
pub type Graphics = Grid<Vec<ColorIndex>>;

/// Do `p1` and `p2` agree on every cell of their overlap when `p2`'s window
/// is offset by `(dx, dy)`? At `(0, 0)` this is pattern equality.
fn agrees(p1: &Pattern, p2: &Pattern, dx: i32, dy: i32, n: i32) -> bool {
    let xmin = if dx < 0 { 0 } else { dx };
    let xmax = if dx < 0 { dx + n } else { n };
    let ymin = if dy < 0 { 0 } else { dy };
    let ymax = if dy < 0 { dy + n } else { n };
    for y in ymin..ymax {
        for x in xmin..xmax {
            if p1[(x + n * y) as usize] != p2[(x - dx + n * (y - dy)) as usize] {
                return false;
            }
        }
    }
    true
}

pub struct OverlappingModel {
    size: Size,
    n: u32,
    periodic_out: bool,
    palette: Palette,
    patterns: PatternTable<Pattern>,
    weights: PatternTable<f64>,
    foundation: Option<PatternId>,
    /// For each pattern, a `(2n-1)²` grid of the patterns that agree with it
    /// at that offset. Grid coord `(dx + n - 1, dy + n - 1)` holds offset
    /// `(dx, dy)`.
    propagator: PatternTable<Grid<Vec<PatternId>>>,
}

impl OverlappingModel {
    pub fn new(
        hashed_patterns: &PatternPrevalence,
        foundation_hash: Option<PatternHash>,
        palette: Palette,
        n: u32,
        periodic_out: bool,
        output_size: Size,
    ) -> Result<Self, Error> {
        assert!(n >= 1);
        assert!(!hashed_patterns.is_empty());

        // Ascending hash order keeps pattern indices deterministic across
        // runs regardless of the prevalence map's iteration order.
        let mut hashes: Vec<(PatternHash, usize)> = hashed_patterns
            .iter()
            .map(|(&hash, &count)| (hash, count))
            .collect();
        hashes.sort_unstable();

        let mut patterns = Vec::with_capacity(hashes.len());
        let mut weights = Vec::with_capacity(hashes.len());
        let mut foundation = None;
        for (hash, count) in hashes {
            if Some(hash) == foundation_hash {
                foundation = Some(patterns.len() as PatternId);
            }
            patterns.push(pattern_from_hash(hash, n, palette.len()));
            weights.push(count as f64);
        }
        let patterns = PatternTable::from_vec(patterns);
        let weights = PatternTable::from_vec(weights);

        let n_i32 = n as i32;
        let offsets = Size::new(2 * n - 1, 2 * n - 1);
        let propagator: PatternTable<Grid<Vec<PatternId>>> = patterns
            .iter()
            .map(|pattern| {
                Grid::new_fn(offsets, |offset| {
                    let dx = offset.x - (n_i32 - 1);
                    let dy = offset.y - (n_i32 - 1);
                    let mut list: Vec<PatternId> = patterns
                        .enumerate()
                        .filter(|(_, other)| agrees(pattern, other, dx, dy, n_i32))
                        .map(|(id, _)| id)
                        .collect();
                    list.shrink_to_fit();
                    list
                })
            })
            .collect();

        let mut longest = 0usize;
        let mut sum = 0usize;
        for per_offset in propagator.iter() {
            for list in per_offset.iter() {
                longest = longest.max(list.len());
                sum += list.len();
            }
        }
        let num_lists = patterns.len() * offsets.count();
        info!(
            "propagator length: mean/max/sum: {:.1}, {}, {}",
            sum as f64 / num_lists as f64,
            longest,
            sum,
        );

        Ok(Self {
            size: output_size,
            n,
            periodic_out,
            palette,
            patterns,
            weights,
            foundation,
            propagator,
        })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn support(&self, pattern_id: PatternId, dx: i32, dy: i32) -> &[PatternId] {
        let n = self.n as i32;
        self.propagator[pattern_id].get_checked(Coord::new(n - 1 + dx, n - 1 + dy))
    }

    /// Palette-index contributor lists for every output cell, gathering every
    /// pattern still possible at each window covering the cell.
    pub fn graphics(&self, wave: &Wave) -> Graphics {
        let n = self.n as i32;
        let width = self.size.width() as i32;
        let height = self.size.height() as i32;
        Grid::new_fn(self.size, |coord| {
            let mut contributors = Vec::new();
            for dy in 0..n {
                for dx in 0..n {
                    let mut sx = coord.x - dx;
                    if sx < 0 {
                        sx += width;
                    }
                    let mut sy = coord.y - dy;
                    if sy < 0 {
                        sy += height;
                    }
                    let source = Coord::new(sx, sy);
                    if self.on_boundary(source) {
                        continue;
                    }
                    for (pattern_id, pattern) in self.patterns.enumerate() {
                        if wave.possible(source, pattern_id) {
                            contributors.push(pattern[(dx + dy * n) as usize]);
                        }
                    }
                }
            }
            contributors
        })
    }
}

impl Model for OverlappingModel {
    fn size(&self) -> Size {
        self.size
    }

    fn num_patterns(&self) -> usize {
        self.patterns.len()
    }

    fn weights(&self) -> &PatternTable<f64> {
        &self.weights
    }

    fn periodic_out(&self) -> bool {
        self.periodic_out
    }

    fn foundation(&self) -> Option<PatternId> {
        self.foundation
    }

    fn on_boundary(&self, coord: Coord) -> bool {
        let n = self.n as i32;
        !self.periodic_out
            && (coord.x + n > self.size.width() as i32 || coord.y + n > self.size.height() as i32)
    }

    fn propagate(&self, wave: &mut Wave) -> bool {
        let n = self.n as i32;
        let width = self.size.width() as i32;
        let height = self.size.height() as i32;
        let mut did_change = false;

        for x1 in 0..width {
            for y1 in 0..height {
                let dirty = Coord::new(x1, y1);
                if !wave.is_dirty(dirty) {
                    continue;
                }
                wave.set_dirty(dirty, false);

                for dx in (1 - n)..n {
                    for dy in (1 - n)..n {
                        let mut sx = x1 + dx;
                        if sx < 0 {
                            sx += width;
                        } else if sx >= width {
                            sx -= width;
                        }
                        let mut sy = y1 + dy;
                        if sy < 0 {
                            sy += height;
                        } else if sy >= height {
                            sy -= height;
                        }

                        if !self.periodic_out && (sx + n > width || sy + n > height) {
                            continue;
                        }
                        let target = Coord::new(sx, sy);

                        for pattern_id in self.patterns.ids() {
                            if !wave.possible(target, pattern_id) {
                                continue;
                            }

                            // Incoming support: patterns at the dirty cell
                            // that agree with `pattern_id` across `(-dx, -dy)`.
                            let can_fit = self
                                .support(pattern_id, -dx, -dy)
                                .iter()
                                .any(|&other| wave.possible(dirty, other));

                            if !can_fit {
                                wave.set_possible(target, pattern_id, false);
                                wave.set_dirty(target, true);
                                did_change = true;
                            }
                        }
                    }
                }
            }
        }

        did_change
    }
}
