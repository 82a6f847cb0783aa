use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use wfc::{NeighborSpec, TileSet, TileSpec};

/// A job file: one image directory plus any number of named overlapping and
/// tiled jobs. Unknown keys are rejected so typos in hand-written files
/// surface as errors instead of silently-ignored options.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub image_dir: String,
    #[serde(default)]
    pub overlapping: BTreeMap<String, OverlappingJob>,
    #[serde(default)]
    pub tiled: BTreeMap<String, TiledJob>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlappingJob {
    pub image: String,
    #[serde(default = "default_n")]
    pub n: u32,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default = "default_symmetry")]
    pub symmetry: usize,
    #[serde(default = "default_true")]
    pub periodic_out: bool,
    #[serde(default = "default_true")]
    pub periodic_in: bool,
    #[serde(default)]
    pub foundation: bool,
    #[serde(default)]
    pub limit: usize,
    #[serde(default = "default_screenshots")]
    pub screenshots: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TiledJob {
    pub subdir: String,
    #[serde(default)]
    pub subset: Option<String>,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default)]
    pub periodic: bool,
    #[serde(default)]
    pub limit: usize,
    #[serde(default = "default_screenshots")]
    pub screenshots: usize,
}

/// The `data.cfg` manifest of a tile set directory.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileSetConfig {
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub unique: bool,
    pub tiles: Vec<TileConfig>,
    #[serde(default)]
    pub neighbors: Vec<NeighborConfig>,
    #[serde(default)]
    pub subsets: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileConfig {
    pub name: String,
    #[serde(default = "default_symmetry_class")]
    pub symmetry: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NeighborConfig {
    pub left: (String, u32),
    pub right: (String, u32),
}

impl TileSetConfig {
    pub fn tile_set(&self) -> Result<TileSet, wfc::Error> {
        let tiles = self
            .tiles
            .iter()
            .map(|tile| {
                Ok(TileSpec {
                    name: tile.name.clone(),
                    symmetry: tile.symmetry.parse()?,
                    weight: tile.weight,
                })
            })
            .collect::<Result<Vec<_>, wfc::Error>>()?;
        let neighbors = self
            .neighbors
            .iter()
            .map(|neighbor| NeighborSpec {
                left: neighbor.left.clone(),
                right: neighbor.right.clone(),
            })
            .collect();
        Ok(TileSet {
            tiles,
            neighbors,
            subsets: self.subsets.clone(),
        })
    }
}

fn default_n() -> u32 {
    3
}

fn default_dimension() -> u32 {
    48
}

fn default_symmetry() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_screenshots() -> usize {
    2
}

fn default_tile_size() -> u32 {
    16
}

fn default_weight() -> f64 {
    1.0
}

fn default_symmetry_class() -> String {
    "X".to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use wfc::Symmetry;

    #[test]
    fn overlapping_job_defaults() {
        let text = r#"{
            "image_dir": "samples/",
            "overlapping": {
                "flowers": { "image": "flowers.png", "symmetry": 2, "foundation": true }
            }
        }"#;
        let jobs: JobFile = serde_json::from_str(text).unwrap();
        assert_eq!(jobs.image_dir, "samples/");
        let job = &jobs.overlapping["flowers"];
        assert_eq!(job.image, "flowers.png");
        assert_eq!(job.n, 3);
        assert_eq!(job.width, 48);
        assert_eq!(job.height, 48);
        assert_eq!(job.symmetry, 2);
        assert!(job.periodic_out);
        assert!(job.periodic_in);
        assert!(job.foundation);
        assert_eq!(job.limit, 0);
        assert_eq!(job.screenshots, 2);
        assert!(jobs.tiled.is_empty());
    }

    #[test]
    fn tiled_job_defaults() {
        let text = r#"{
            "image_dir": "samples/",
            "tiled": {
                "knots": { "subdir": "knots", "subset": "standard", "periodic": true }
            }
        }"#;
        let jobs: JobFile = serde_json::from_str(text).unwrap();
        let job = &jobs.tiled["knots"];
        assert_eq!(job.subdir, "knots");
        assert_eq!(job.subset.as_deref(), Some("standard"));
        assert!(job.periodic);
        assert_eq!(job.width, 48);
        assert_eq!(job.screenshots, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = r#"{
            "image_dir": "samples/",
            "overlapping": {
                "flowers": { "image": "flowers.png", "symmetryy": 2 }
            }
        }"#;
        assert!(serde_json::from_str::<JobFile>(text).is_err());
    }

    #[test]
    fn tile_manifest_conversion() {
        let text = r#"{
            "tile_size": 8,
            "tiles": [
                { "name": "corner", "symmetry": "L", "weight": 0.5 },
                { "name": "cross", "symmetry": "I" },
                { "name": "empty" }
            ],
            "neighbors": [
                { "left": ["corner", 1], "right": ["cross", 0] }
            ],
            "subsets": { "simple": ["cross", "empty"] }
        }"#;
        let manifest: TileSetConfig = serde_json::from_str(text).unwrap();
        assert_eq!(manifest.tile_size, 8);
        assert!(!manifest.unique);
        let tile_set = manifest.tile_set().unwrap();
        assert_eq!(tile_set.tiles.len(), 3);
        assert_eq!(tile_set.tiles[0].symmetry, Symmetry::L);
        assert_eq!(tile_set.tiles[0].weight, 0.5);
        assert_eq!(tile_set.tiles[1].symmetry, Symmetry::I);
        assert_eq!(tile_set.tiles[2].symmetry, Symmetry::X);
        assert_eq!(tile_set.tiles[2].weight, 1.0);
        assert_eq!(tile_set.neighbors[0].left, ("corner".to_string(), 1));
        assert_eq!(tile_set.subsets["simple"].len(), 2);
    }

    #[test]
    fn bad_symmetry_class() {
        let text = r#"{ "tiles": [ { "name": "a", "symmetry": "Q" } ] }"#;
        let manifest: TileSetConfig = serde_json::from_str(text).unwrap();
        assert!(matches!(
            manifest.tile_set(),
            Err(wfc::Error::UnknownSymmetry(_)),
        ));
    }
}
