use std::fmt;

use coord_2d::Coord;
use rand::Rng;

use crate::model::Model;
use crate::pattern::PatternId;
use crate::wave::Wave;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fail,
    Unfinished,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Fail => "fail",
            Outcome::Unfinished => "unfinished",
        };
        write!(f, "{}", s)
    }
}

enum LowestEntropy {
    Fail,
    AllDecided,
    Cell(Coord),
}

/// Scans for the undecided, non-boundary cell with the smallest sum of
/// surviving pattern weights. The sum is the exp-entropy surrogate: monotone
/// in true entropy for a fixed weight profile and much cheaper.
fn find_lowest_entropy<M, R>(model: &M, wave: &Wave, rng: &mut R) -> LowestEntropy
where
    M: Model + ?Sized,
    R: Rng,
{
    let weights = model.weights();
    let size = model.size();
    let mut min = f64::INFINITY;
    let mut argmin = None;

    for x in 0..size.width() as i32 {
        for y in 0..size.height() as i32 {
            let coord = Coord::new(x, y);
            if model.on_boundary(coord) {
                continue;
            }

            let mut num_superimposed = 0usize;
            let mut entropy = 0.0;
            for (pattern_id, &weight) in weights.enumerate() {
                if wave.possible(coord, pattern_id) {
                    num_superimposed += 1;
                    entropy += weight;
                }
            }

            if entropy == 0.0 || num_superimposed == 0 {
                return LowestEntropy::Fail;
            }

            if num_superimposed == 1 {
                continue; // already frozen
            }

            // Tie-breaking bias; the magnitude is in weight units, so it only
            // decides between cells whose weight sums are closer than 0.5.
            let noise = 0.5 * rng.gen::<f64>();
            let entropy = entropy + noise;

            if entropy < min {
                min = entropy;
                argmin = Some(coord);
            }
        }
    }

    match argmin {
        Some(coord) => LowestEntropy::Cell(coord),
        None => LowestEntropy::AllDecided,
    }
}

/// Picks an index weighted by `weights`. A zero total falls back to the
/// uniform choice `floor(u * len)`.
fn weighted_choice(weights: &[f64], between_zero_and_one: f64) -> usize {
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        return (between_zero_and_one * weights.len() as f64).floor() as usize;
    }

    let between_zero_and_sum = between_zero_and_one * sum;
    let mut accumulated = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        accumulated += weight;
        if between_zero_and_sum <= accumulated {
            return index;
        }
    }
    0
}

/// Collapses the lowest-entropy cell to a single pattern drawn from the
/// surviving weights, or reports that the wave is solved or contradictory.
pub fn observe<M, R>(model: &M, wave: &mut Wave, rng: &mut R) -> Outcome
where
    M: Model + ?Sized,
    R: Rng,
{
    let coord = match find_lowest_entropy(model, wave, rng) {
        LowestEntropy::Fail => return Outcome::Fail,
        LowestEntropy::AllDecided => return Outcome::Success,
        LowestEntropy::Cell(coord) => coord,
    };

    let weights = model.weights();
    let distribution: Vec<f64> = weights
        .enumerate()
        .map(|(pattern_id, &weight)| {
            if wave.possible(coord, pattern_id) {
                weight
            } else {
                0.0
            }
        })
        .collect();
    let chosen = weighted_choice(&distribution, rng.gen::<f64>()) as PatternId;

    for pattern_id in weights.ids() {
        wave.set_possible(coord, pattern_id, pattern_id == chosen);
    }
    wave.set_dirty(coord, true);

    Outcome::Unfinished
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn weighted_choice_walks_accumulated_weight() {
        let weights = [1.0, 2.0, 1.0];
        assert_eq!(weighted_choice(&weights, 0.0), 0);
        assert_eq!(weighted_choice(&weights, 0.2), 0);
        assert_eq!(weighted_choice(&weights, 0.3), 1);
        assert_eq!(weighted_choice(&weights, 0.74), 1);
        assert_eq!(weighted_choice(&weights, 0.8), 2);
        assert_eq!(weighted_choice(&weights, 0.999), 2);
    }

    #[test]
    fn weighted_choice_skips_zero_weights() {
        let weights = [0.0, 1.0, 0.0];
        assert_eq!(weighted_choice(&weights, 0.0), 1);
        assert_eq!(weighted_choice(&weights, 0.99), 1);
    }

    #[test]
    fn weighted_choice_zero_sum_is_uniform() {
        let weights = [0.0, 0.0, 0.0, 0.0];
        assert_eq!(weighted_choice(&weights, 0.0), 0);
        assert_eq!(weighted_choice(&weights, 0.5), 2);
        assert_eq!(weighted_choice(&weights, 0.99), 3);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::Success.to_string(), "success");
        assert_eq!(Outcome::Fail.to_string(), "fail");
        assert_eq!(Outcome::Unfinished.to_string(), "unfinished");
    }
}
