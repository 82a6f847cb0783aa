use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbaImage};
use thiserror::Error;

use wfc::{
    Coord, Graphics, Model, OverlappingModel, Palette, PalettedImage, Rgba, Size, TileModel, Wave,
};

/// Overlapping-model outputs are upscaled by this factor before saving.
pub const UPSCALE: u32 = 4;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Model(#[from] wfc::Error),
    #[error("tile bitmap '{name}' has {got} samples, expected {expected}")]
    TileSize {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Reduces a decoded image to palette indices. Greyscale images promote to
/// RGBA with alpha taken from the luminance; fully-transparent pixels are
/// canonicalized to `{0,0,0,0}`.
pub fn sample_from_image(image: &DynamicImage) -> Result<PalettedImage, Error> {
    let pixels: Vec<Rgba> = match image {
        DynamicImage::ImageLuma8(grey) => grey
            .pixels()
            .map(|pixel| {
                let level = pixel.0[0];
                Rgba {
                    r: level,
                    g: level,
                    b: level,
                    a: level,
                }
            })
            .collect(),
        other => other
            .to_rgba8()
            .pixels()
            .map(|pixel| {
                let [r, g, b, a] = pixel.0;
                if a == 0 {
                    Rgba {
                        r: 0,
                        g: 0,
                        b: 0,
                        a: 0,
                    }
                } else {
                    Rgba { r, g, b, a }
                }
            })
            .collect(),
    };
    let (width, height) = image.dimensions();
    Ok(PalettedImage::from_pixels(Size::new(width, height), &pixels)?)
}

pub fn load_sample(path: &Path) -> Result<PalettedImage, Error> {
    let image = image::open(path)?;
    sample_from_image(&image)
}

fn put_rgba(image: &mut RgbaImage, x: u32, y: u32, color: Rgba) {
    image.put_pixel(x, y, image::Rgba([color.r, color.g, color.b, color.a]));
}

/// Averages each cell's contributor colors into a pixel. Cells with no
/// contributors (contradictions, unconstrained borders) come out opaque
/// black.
pub fn image_from_graphics(graphics: &Graphics, palette: &Palette) -> RgbaImage {
    let size = graphics.size();
    let mut image = RgbaImage::new(size.width(), size.height());
    for (coord, contributors) in graphics.enumerate() {
        let color = if contributors.is_empty() {
            Rgba {
                r: 0,
                g: 0,
                b: 0,
                a: 255,
            }
        } else if contributors.len() == 1 {
            palette[contributors[0] as usize]
        } else {
            let mut r = 0usize;
            let mut g = 0usize;
            let mut b = 0usize;
            let mut a = 0usize;
            for &contributor in contributors {
                let color = palette[contributor as usize];
                r += color.r as usize;
                g += color.g as usize;
                b += color.b as usize;
                a += color.a as usize;
            }
            let count = contributors.len();
            Rgba {
                r: (r / count) as u8,
                g: (g / count) as u8,
                b: (b / count) as u8,
                a: (a / count) as u8,
            }
        };
        put_rgba(&mut image, coord.x as u32, coord.y as u32, color);
    }
    image
}

pub fn upsample(image: &RgbaImage, factor: u32) -> RgbaImage {
    let mut result = RgbaImage::new(image.width() * factor, image.height() * factor);
    for y in 0..result.height() {
        for x in 0..result.width() {
            result.put_pixel(x, y, *image.get_pixel(x / factor, y / factor));
        }
    }
    result
}

/// One step of the trailing animation on periodic outputs.
pub fn scroll_diagonally(image: &RgbaImage) -> RgbaImage {
    let width = image.width();
    let height = image.height();
    let mut result = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            result.put_pixel(x, y, *image.get_pixel((x + 1) % width, (y + 1) % height));
        }
    }
    result
}

pub fn render_overlapping(model: &OverlappingModel, wave: &Wave) -> RgbaImage {
    upsample(
        &image_from_graphics(&model.graphics(wave), model.palette()),
        UPSCALE,
    )
}

/// `tile_size * tile_size` RGBA samples in row-major order.
pub type Tile = Vec<Rgba>;

pub fn rotate_tile(tile: &Tile, tile_size: u32) -> Tile {
    let mut result = Tile::with_capacity(tile.len());
    for y in 0..tile_size {
        for x in 0..tile_size {
            result.push(tile[(tile_size - 1 - y + x * tile_size) as usize]);
        }
    }
    result
}

pub fn load_tile_bitmap(path: &Path) -> Result<Tile, Error> {
    let image = image::open(path)?.to_rgba8();
    Ok(image
        .pixels()
        .map(|pixel| {
            let [r, g, b, a] = pixel.0;
            Rgba { r, g, b, a }
        })
        .collect())
}

/// One bitmap per oriented pattern of a tile model. In unique mode every
/// orientation is loaded from its own bitmap, named `"<tile> <rotation>"`;
/// otherwise orientations beyond the first are generated by rotation.
pub struct TileBitmaps {
    tile_size: u32,
    bitmaps: Vec<Tile>,
}

impl TileBitmaps {
    pub fn load<F>(model: &TileModel, tile_size: u32, unique: bool, mut loader: F) -> Result<Self, Error>
    where
        F: FnMut(&str) -> Result<Tile, Error>,
    {
        let expected = (tile_size * tile_size) as usize;
        let check = |name: &str, bitmap: Tile| {
            if bitmap.len() == expected {
                Ok(bitmap)
            } else {
                Err(Error::TileSize {
                    name: name.to_string(),
                    expected,
                    got: bitmap.len(),
                })
            }
        };

        let mut bitmaps = Vec::new();
        for tile in model.tiles() {
            if unique {
                for rotation in 0..tile.cardinality {
                    let name = format!("{} {}", tile.name, rotation);
                    let bitmap = check(&name, loader(&name)?)?;
                    bitmaps.push(bitmap);
                }
            } else {
                let bitmap = check(&tile.name, loader(&tile.name)?)?;
                bitmaps.push(bitmap);
                for _ in 1..tile.cardinality {
                    let rotated = rotate_tile(bitmaps.last().expect("base bitmap"), tile_size);
                    bitmaps.push(rotated);
                }
            }
        }

        Ok(Self { tile_size, bitmaps })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Weighted-average rendering: undecided cells blend their surviving
    /// tiles by weight, contradictory cells come out opaque black.
    pub fn render(&self, model: &TileModel, wave: &Wave) -> RgbaImage {
        let size = wave.size();
        let tile_size = self.tile_size;
        let weights = model.weights();
        let mut image = RgbaImage::new(size.width() * tile_size, size.height() * tile_size);

        for x in 0..size.width() as i32 {
            for y in 0..size.height() as i32 {
                let coord = Coord::new(x, y);
                let mut sum = 0.0;
                for pattern_id in weights.ids() {
                    if wave.possible(coord, pattern_id) {
                        sum += weights[pattern_id];
                    }
                }

                for yt in 0..tile_size {
                    for xt in 0..tile_size {
                        let color = if sum == 0.0 {
                            Rgba {
                                r: 0,
                                g: 0,
                                b: 0,
                                a: 255,
                            }
                        } else {
                            let mut r = 0.0f64;
                            let mut g = 0.0f64;
                            let mut b = 0.0f64;
                            let mut a = 0.0f64;
                            for pattern_id in weights.ids() {
                                if wave.possible(coord, pattern_id) {
                                    let sample = self.bitmaps[pattern_id as usize]
                                        [(xt + yt * tile_size) as usize];
                                    let weight = weights[pattern_id] / sum;
                                    r += sample.r as f64 * weight;
                                    g += sample.g as f64 * weight;
                                    b += sample.b as f64 * weight;
                                    a += sample.a as f64 * weight;
                                }
                            }
                            Rgba {
                                r: r as u8,
                                g: g as u8,
                                b: b as u8,
                                a: a as u8,
                            }
                        };
                        put_rgba(
                            &mut image,
                            x as u32 * tile_size + xt,
                            y as u32 * tile_size + yt,
                            color,
                        );
                    }
                }
            }
        }

        image
    }
}
