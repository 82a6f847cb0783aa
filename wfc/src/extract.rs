use coord_2d::Coord;
use hashbrown::HashMap;

use crate::errors::Error;
use crate::palette::PalettedImage;
use crate::pattern::{
    check_hash_capacity, hash_from_pattern, make_pattern, reflect, rotate, Pattern, PatternHash,
};

/// How often each pattern (keyed by hash) occurs in the sample, counting the
/// symmetry variants that were kept.
pub type PatternPrevalence = HashMap<PatternHash, usize>;

pub struct Extraction {
    pub prevalence: PatternPrevalence,
    /// Hash of the last kept variant anchored on the bottom sample row, when
    /// requested. Used to pin the bottom row of the output.
    pub foundation: Option<PatternHash>,
}

/// Tallies every `n`x`n` window of the sample under the first `symmetry` of
/// its eight dihedral variants. Anchors cover the full sample when
/// `periodic_in`, otherwise only windows that fit.
pub fn extract_patterns(
    sample: &PalettedImage,
    n: u32,
    periodic_in: bool,
    symmetry: usize,
    collect_foundation: bool,
) -> Result<Extraction, Error> {
    let width = sample.width();
    let height = sample.height();
    if n == 0 || n > width || n > height {
        return Err(Error::PatternTooLarge { n, width, height });
    }
    if !(1..=8).contains(&symmetry) {
        return Err(Error::SymmetryOutOfRange(symmetry));
    }
    check_hash_capacity(sample.palette().len(), n)?;

    let pattern_at = |x: u32, y: u32| {
        make_pattern(n, |dx, dy| {
            sample.at_wrapped(Coord::new((x + dx) as i32, (y + dy) as i32))
        })
    };

    let mut prevalence = PatternPrevalence::new();
    let mut foundation = None;

    let anchors_y = if periodic_in { height } else { height - n + 1 };
    let anchors_x = if periodic_in { width } else { width - n + 1 };
    for y in 0..anchors_y {
        for x in 0..anchors_x {
            let mut variants: [Pattern; 8] = Default::default();
            variants[0] = pattern_at(x, y);
            variants[1] = reflect(&variants[0], n);
            variants[2] = rotate(&variants[0], n);
            variants[3] = reflect(&variants[2], n);
            variants[4] = rotate(&variants[2], n);
            variants[5] = reflect(&variants[4], n);
            variants[6] = rotate(&variants[4], n);
            variants[7] = reflect(&variants[6], n);

            for variant in variants.iter().take(symmetry) {
                let hash = hash_from_pattern(variant, sample.palette().len());
                *prevalence.entry(hash).or_insert(0) += 1;
                if collect_foundation && y == height - 1 {
                    foundation = Some(hash);
                }
            }
        }
    }

    Ok(Extraction {
        prevalence,
        foundation,
    })
}
