use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use coord_2d::{Coord, Size};
use direction::{CardinalDirection, CardinalDirectionTable, CardinalDirections};
use log::info;

use crate::errors::Error;
use crate::model::Model;
use crate::pattern::{PatternId, PatternTable};
use crate::wave::Wave;

/// How a tile's rotations and reflections fold into distinct oriented
/// patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// Fully symmetric; one orientation.
    X,
    /// Two-fold, straight (e.g. a line); two orientations.
    I,
    /// Two-fold, diagonal; two orientations.
    Backslash,
    /// Four orientations, mirror-symmetric about one axis.
    T,
    /// Four orientations, chiral under reflection.
    L,
}

impl Symmetry {
    pub fn cardinality(self) -> u32 {
        match self {
            Symmetry::X => 1,
            Symmetry::I | Symmetry::Backslash => 2,
            Symmetry::T | Symmetry::L => 4,
        }
    }

    fn rotated(self, i: u32) -> u32 {
        match self {
            Symmetry::X => i,
            Symmetry::I | Symmetry::Backslash => 1 - i,
            Symmetry::T | Symmetry::L => (i + 1) % 4,
        }
    }

    fn reflected(self, i: u32) -> u32 {
        match self {
            Symmetry::X | Symmetry::I => i,
            Symmetry::Backslash => 1 - i,
            Symmetry::T => {
                if i % 2 == 0 {
                    i
                } else {
                    4 - i
                }
            }
            Symmetry::L => {
                if i % 2 == 0 {
                    i + 1
                } else {
                    i - 1
                }
            }
        }
    }
}

impl FromStr for Symmetry {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "X" => Ok(Symmetry::X),
            "I" => Ok(Symmetry::I),
            "\\" => Ok(Symmetry::Backslash),
            "T" => Ok(Symmetry::T),
            "L" => Ok(Symmetry::L),
            other => Err(Error::UnknownSymmetry(other.to_string())),
        }
    }
}

/// `[identity, a, a², a³, b, b·a, b·a², b·a³]` of orientation `t`, where `a`
/// rotates and `b` reflects within the tile's symmetry class.
fn action_map(symmetry: Symmetry, t: u32) -> [u32; 8] {
    let a = |i| symmetry.rotated(i);
    let b = |i| symmetry.reflected(i);
    [
        t,
        a(t),
        a(a(t)),
        a(a(a(t))),
        b(t),
        b(a(t)),
        b(a(a(t))),
        b(a(a(a(t)))),
    ]
}

pub struct TileSpec {
    pub name: String,
    pub symmetry: Symmetry,
    pub weight: f64,
}

/// A declared horizontal abutment: `left` may sit immediately left of
/// `right`, each at the given rotation of its base orientation.
pub struct NeighborSpec {
    pub left: (String, u32),
    pub right: (String, u32),
}

pub struct TileSet {
    pub tiles: Vec<TileSpec>,
    pub neighbors: Vec<NeighborSpec>,
    pub subsets: HashMap<String, Vec<String>>,
}

/// The block of consecutive oriented patterns a tile contributed to the
/// model's pattern index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOrientations {
    pub name: String,
    pub base: PatternId,
    pub cardinality: u32,
}

pub struct TileModel {
    size: Size,
    periodic_out: bool,
    weights: PatternTable<f64>,
    tiles: Vec<TileOrientations>,
    /// `compat[a].get(d)[b]`: may oriented pattern `b` sit one step in
    /// direction `d` from `a`? East/North entries are seeded from neighbor
    /// declarations, West/South are their mirrors.
    compat: PatternTable<CardinalDirectionTable<Vec<bool>>>,
}

impl TileModel {
    pub fn new(
        tile_set: &TileSet,
        subset: Option<&str>,
        output_size: Size,
        periodic_out: bool,
    ) -> Result<Self, Error> {
        let subset_names: Option<HashSet<&str>> = match subset {
            None | Some("") => None,
            Some(name) => {
                let members = tile_set
                    .subsets
                    .get(name)
                    .ok_or_else(|| Error::UnknownSubset(name.to_string()))?;
                Some(members.iter().map(|member| member.as_str()).collect())
            }
        };
        let in_subset = |tile_name: &str| match &subset_names {
            Some(names) => names.contains(tile_name),
            None => true,
        };

        let mut action: Vec<[usize; 8]> = Vec::new();
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut tiles = Vec::new();
        let mut weights = Vec::new();

        for tile in &tile_set.tiles {
            if !in_subset(&tile.name) {
                continue;
            }
            let cardinality = tile.symmetry.cardinality();
            let base = action.len();
            first_occurrence.insert(&tile.name, base);
            for t in 0..cardinality {
                let map = action_map(tile.symmetry, t);
                action.push(map.map(|i| i as usize + base));
            }
            tiles.push(TileOrientations {
                name: tile.name.clone(),
                base: base as PatternId,
                cardinality,
            });
            for _ in 0..cardinality {
                weights.push(tile.weight);
            }
        }

        let num_patterns = action.len();
        info!("{} oriented tile patterns", num_patterns);

        let mut compat: Vec<CardinalDirectionTable<Vec<bool>>> = (0..num_patterns)
            .map(|_| {
                let mut table = CardinalDirectionTable::default();
                for direction in CardinalDirections {
                    *table.get_mut(direction) = vec![false; num_patterns];
                }
                table
            })
            .collect();

        let oriented = |name: &str, rotation: u32| -> Result<usize, Error> {
            let base = *first_occurrence
                .get(name)
                .ok_or_else(|| Error::UnknownTile(name.to_string()))?;
            action[base]
                .get(rotation as usize)
                .copied()
                .ok_or(Error::RotationOutOfRange(rotation))
        };

        for neighbor in &tile_set.neighbors {
            let (left_name, left_rotation) = &neighbor.left;
            let (right_name, right_rotation) = &neighbor.right;
            if !in_subset(left_name) || !in_subset(right_name) {
                continue;
            }

            let left = oriented(left_name, *left_rotation)?;
            let right = oriented(right_name, *right_rotation)?;
            let down = action[left][1];
            let up = action[right][1];

            use CardinalDirection::{East, North};
            // the declared abutment plus its three symmetric re-rotations
            compat[left].get_mut(East)[right] = true;
            compat[action[left][6]].get_mut(East)[action[right][6]] = true;
            compat[action[right][4]].get_mut(East)[action[left][4]] = true;
            compat[action[right][2]].get_mut(East)[action[left][2]] = true;

            compat[down].get_mut(North)[up] = true;
            compat[action[up][6]].get_mut(North)[action[down][6]] = true;
            compat[action[down][4]].get_mut(North)[action[up][4]] = true;
            compat[action[up][2]].get_mut(North)[action[down][2]] = true;
        }

        // reverse directions are mirrors of the seeded ones
        use CardinalDirection::{East, North, South, West};
        for a in 0..num_patterns {
            for b in 0..num_patterns {
                let east = compat[b].get(East)[a];
                compat[a].get_mut(West)[b] = east;
                let north = compat[b].get(North)[a];
                compat[a].get_mut(South)[b] = north;
            }
        }

        Ok(Self {
            size: output_size,
            periodic_out,
            weights: PatternTable::from_vec(weights),
            tiles,
            compat: PatternTable::from_vec(compat),
        })
    }

    pub fn tiles(&self) -> &[TileOrientations] {
        &self.tiles
    }

    fn compatible(
        &self,
        source: PatternId,
        direction: CardinalDirection,
        target: PatternId,
    ) -> bool {
        self.compat[source].get(direction)[target as usize]
    }
}

impl Model for TileModel {
    fn size(&self) -> Size {
        self.size
    }

    fn num_patterns(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> &PatternTable<f64> {
        &self.weights
    }

    fn periodic_out(&self) -> bool {
        self.periodic_out
    }

    fn on_boundary(&self, _coord: Coord) -> bool {
        false
    }

    fn propagate(&self, wave: &mut Wave) -> bool {
        let size = self.size;
        let mut did_change = false;

        for x2 in 0..size.width() as i32 {
            for y2 in 0..size.height() as i32 {
                let target = Coord::new(x2, y2);
                for direction in CardinalDirections {
                    // the cell whose patterns must support the target's,
                    // one step against `direction`
                    let source_raw = target + direction.opposite().coord();
                    let source = if source_raw.is_valid(size) {
                        source_raw
                    } else if self.periodic_out {
                        source_raw.normalize(size)
                    } else {
                        continue;
                    };

                    if !wave.is_dirty(source) {
                        continue;
                    }

                    for t2 in self.weights.ids() {
                        if !wave.possible(target, t2) {
                            continue;
                        }
                        let supported = self.weights.ids().any(|t1| {
                            wave.possible(source, t1) && self.compatible(t1, direction, t2)
                        });
                        if !supported {
                            wave.set_possible(target, t2, false);
                            wave.set_dirty(target, true);
                            did_change = true;
                        }
                    }
                }
            }
        }

        did_change
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observe::Outcome;
    use crate::run::{collapse, create_wave};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn tile(name: &str, symmetry: Symmetry) -> TileSpec {
        TileSpec {
            name: name.to_string(),
            symmetry,
            weight: 1.0,
        }
    }

    fn pair(left: &str, left_rotation: u32, right: &str, right_rotation: u32) -> NeighborSpec {
        NeighborSpec {
            left: (left.to_string(), left_rotation),
            right: (right.to_string(), right_rotation),
        }
    }

    #[test]
    fn symmetry_parsing() {
        assert_eq!("X".parse::<Symmetry>().unwrap(), Symmetry::X);
        assert_eq!("\\".parse::<Symmetry>().unwrap(), Symmetry::Backslash);
        assert!(matches!(
            "Y".parse::<Symmetry>(),
            Err(Error::UnknownSymmetry(_)),
        ));
    }

    #[test]
    fn action_maps() {
        assert_eq!(action_map(Symmetry::X, 0), [0; 8]);
        assert_eq!(action_map(Symmetry::I, 0), [0, 1, 0, 1, 0, 1, 0, 1]);
        assert_eq!(action_map(Symmetry::I, 1), [1, 0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(action_map(Symmetry::Backslash, 0), [0, 1, 0, 1, 1, 0, 1, 0]);
        assert_eq!(action_map(Symmetry::T, 0), [0, 1, 2, 3, 0, 3, 2, 1]);
        assert_eq!(action_map(Symmetry::T, 1), [1, 2, 3, 0, 3, 2, 1, 0]);
        assert_eq!(action_map(Symmetry::L, 0), [0, 1, 2, 3, 1, 0, 3, 2]);
    }

    #[test]
    fn direction_mirror_symmetry() {
        let tile_set = TileSet {
            tiles: vec![tile("corner", Symmetry::L), tile("line", Symmetry::I)],
            neighbors: vec![pair("corner", 0, "line", 0), pair("line", 1, "corner", 2)],
            subsets: HashMap::new(),
        };
        let model = TileModel::new(&tile_set, None, Size::new(4, 4), true).unwrap();
        use CardinalDirection::{East, North, South, West};
        for a in model.weights.ids() {
            for b in model.weights.ids() {
                assert_eq!(model.compatible(a, West, b), model.compatible(b, East, a));
                assert_eq!(model.compatible(a, South, b), model.compatible(b, North, a));
            }
        }
    }

    #[test]
    fn no_neighbors_contradicts_immediately() {
        let tile_set = TileSet {
            tiles: vec![tile("line", Symmetry::I)],
            neighbors: vec![],
            subsets: HashMap::new(),
        };
        let model = TileModel::new(&tile_set, None, Size::new(2, 2), false).unwrap();
        assert_eq!(model.num_patterns(), 2);

        let mut wave = create_wave(&model);
        let mut rng = XorShiftRng::seed_from_u64(0);
        assert_eq!(collapse(&model, &mut wave, 0, &mut rng), Outcome::Fail);
    }

    #[test]
    fn self_neighbor_fills_the_grid() {
        let tile_set = TileSet {
            tiles: vec![tile("solid", Symmetry::X)],
            neighbors: vec![pair("solid", 0, "solid", 0)],
            subsets: HashMap::new(),
        };
        let model = TileModel::new(&tile_set, None, Size::new(5, 4), true).unwrap();
        assert_eq!(model.num_patterns(), 1);
        use CardinalDirection::{East, North, South, West};
        for direction in [East, North, South, West] {
            assert!(model.compatible(0, direction, 0));
        }

        let mut wave = create_wave(&model);
        let mut rng = XorShiftRng::seed_from_u64(1);
        assert_eq!(collapse(&model, &mut wave, 0, &mut rng), Outcome::Success);
        for x in 0..5 {
            for y in 0..4 {
                assert_eq!(wave.decided_pattern(Coord::new(x, y)), Some(0));
            }
        }
    }

    #[test]
    fn subset_filters_tiles_and_neighbors() {
        let mut subsets = HashMap::new();
        subsets.insert("solo".to_string(), vec!["a".to_string()]);
        let tile_set = TileSet {
            tiles: vec![tile("a", Symmetry::X), tile("b", Symmetry::T)],
            neighbors: vec![pair("a", 0, "a", 0), pair("a", 0, "b", 1)],
            subsets,
        };

        let full = TileModel::new(&tile_set, None, Size::new(4, 4), true).unwrap();
        assert_eq!(full.num_patterns(), 5);
        assert_eq!(full.tiles().len(), 2);

        // an empty subset name is no filter at all
        let unfiltered = TileModel::new(&tile_set, Some(""), Size::new(4, 4), true).unwrap();
        assert_eq!(unfiltered.num_patterns(), 5);

        let solo = TileModel::new(&tile_set, Some("solo"), Size::new(4, 4), true).unwrap();
        assert_eq!(solo.num_patterns(), 1);
        assert_eq!(solo.tiles(), &[TileOrientations {
            name: "a".to_string(),
            base: 0,
            cardinality: 1,
        }]);

        assert!(matches!(
            TileModel::new(&tile_set, Some("missing"), Size::new(4, 4), true),
            Err(Error::UnknownSubset(_)),
        ));
    }

    #[test]
    fn unknown_tile_in_neighbors() {
        let tile_set = TileSet {
            tiles: vec![tile("a", Symmetry::X)],
            neighbors: vec![pair("a", 0, "ghost", 0)],
            subsets: HashMap::new(),
        };
        assert!(matches!(
            TileModel::new(&tile_set, None, Size::new(4, 4), true),
            Err(Error::UnknownTile(_)),
        ));
    }

    #[test]
    fn rotation_out_of_range() {
        let tile_set = TileSet {
            tiles: vec![tile("a", Symmetry::X)],
            neighbors: vec![pair("a", 0, "a", 8)],
            subsets: HashMap::new(),
        };
        assert!(matches!(
            TileModel::new(&tile_set, None, Size::new(4, 4), true),
            Err(Error::RotationOutOfRange(8)),
        ));
    }
}
