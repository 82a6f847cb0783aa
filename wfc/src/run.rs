use coord_2d::Coord;
use log::info;
use rand::Rng;

use crate::model::Model;
use crate::observe::{observe, Outcome};
use crate::wave::Wave;

/// A fresh, fully-undecided wave for `model`. When the model carries a
/// foundation pattern the bottom row is pinned to it, the pattern is
/// forbidden everywhere else, and the constraints are propagated to a fixed
/// point before the first observation.
pub fn create_wave<M>(model: &M) -> Wave
where
    M: Model + ?Sized,
{
    let size = model.size();
    let mut wave = Wave::new(size, model.num_patterns());

    if let Some(foundation) = model.foundation() {
        let bottom = size.height() as i32 - 1;
        for x in 0..size.width() as i32 {
            for y in 0..size.height() as i32 {
                let coord = Coord::new(x, y);
                if y == bottom {
                    for pattern_id in model.weights().ids() {
                        if pattern_id != foundation {
                            wave.set_possible(coord, pattern_id, false);
                        }
                    }
                } else {
                    wave.set_possible(coord, foundation, false);
                }
                wave.set_dirty(coord, true);
            }
        }
        while model.propagate(&mut wave) {}
    }

    wave
}

/// Drives observe/propagate until the wave collapses, contradicts, or the
/// iteration `limit` is reached (`0` means unbounded). `on_observe` fires
/// after every observation, before the propagation sweeps — the snapshot
/// hook used for animation export.
pub fn run<M, R, F>(model: &M, wave: &mut Wave, limit: usize, rng: &mut R, mut on_observe: F) -> Outcome
where
    M: Model + ?Sized,
    R: Rng,
    F: FnMut(usize, &Wave),
{
    let mut iteration = 0;
    loop {
        if limit != 0 && iteration == limit {
            info!("unfinished after {} iterations", iteration);
            return Outcome::Unfinished;
        }

        let outcome = observe(model, wave, rng);
        on_observe(iteration, wave);
        if outcome != Outcome::Unfinished {
            info!("{} after {} iterations", outcome, iteration);
            return outcome;
        }

        while model.propagate(wave) {}
        iteration += 1;
    }
}

/// `run` without a snapshot hook.
pub fn collapse<M, R>(model: &M, wave: &mut Wave, limit: usize, rng: &mut R) -> Outcome
where
    M: Model + ?Sized,
    R: Rng,
{
    run(model, wave, limit, rng, |_, _| ())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::extract::extract_patterns;
    use crate::palette::{PalettedImage, Rgba};
    use crate::pattern::PatternId;
    use crate::retry::{NumTimes, Retry};
    use crate::{OverlappingModel, Symmetry, TileModel, TileSet, TileSpec};
    use coord_2d::{Coord, Size};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn checkerboard_model(output_size: Size) -> OverlappingModel {
        let pixels: Vec<Rgba> = (0..16)
            .map(|i| {
                let level = (((i % 4) + (i / 4)) % 2 * 255) as u8;
                Rgba {
                    r: level,
                    g: level,
                    b: level,
                    a: 255,
                }
            })
            .collect();
        let sample = PalettedImage::from_pixels(Size::new(4, 4), &pixels).unwrap();
        let extraction = extract_patterns(&sample, 2, true, 1, false).unwrap();
        OverlappingModel::new(
            &extraction.prevalence,
            None,
            sample.palette().clone(),
            2,
            true,
            output_size,
        )
        .unwrap()
    }

    fn snapshot(wave: &Wave) -> Vec<bool> {
        let size = wave.size();
        let mut cells = Vec::new();
        for x in 0..size.width() as i32 {
            for y in 0..size.height() as i32 {
                for t in 0..wave.num_patterns() as PatternId {
                    cells.push(wave.possible(Coord::new(x, y), t));
                }
            }
        }
        cells
    }

    #[test]
    fn eliminations_are_monotone() {
        let model = checkerboard_model(Size::new(8, 8));
        let mut wave = create_wave(&model);
        let mut rng = XorShiftRng::seed_from_u64(5);
        let mut previous = snapshot(&wave);
        let outcome = run(&model, &mut wave, 0, &mut rng, |_, wave| {
            let current = snapshot(wave);
            for (&was, &is) in previous.iter().zip(current.iter()) {
                assert!(was || !is);
            }
            previous = current;
        });
        assert_eq!(outcome, Outcome::Success);
        let current = snapshot(&wave);
        for (&was, &is) in previous.iter().zip(current.iter()) {
            assert!(was || !is);
        }
    }

    #[test]
    fn retry_returns_first_success() {
        let model = checkerboard_model(Size::new(8, 8));
        let mut rng = XorShiftRng::seed_from_u64(6);
        let (outcome, wave) = NumTimes(10).retry(&model, 0, &mut rng);
        assert_eq!(outcome, Outcome::Success);
        assert!(wave.decided_pattern(Coord::new(0, 0)).is_some());
    }

    #[test]
    fn retry_gives_up_after_contradictions() {
        let tile_set = TileSet {
            tiles: vec![TileSpec {
                name: "line".to_string(),
                symmetry: Symmetry::I,
                weight: 1.0,
            }],
            neighbors: vec![],
            subsets: Default::default(),
        };
        let model = TileModel::new(&tile_set, None, Size::new(2, 2), false).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(7);
        let (outcome, _wave) = NumTimes(3).retry(&model, 0, &mut rng);
        assert_eq!(outcome, Outcome::Fail);
    }
}
