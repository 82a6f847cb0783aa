use coord_2d::{Coord, Size};
use grid_2d::Grid;

use crate::errors::Error;
use crate::pattern::ColorIndex;

pub const MAX_COLORS: usize = 1 << (std::mem::size_of::<ColorIndex>() * 8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Ordered sequence of distinct colors; a color's index is its position.
pub type Palette = Vec<Rgba>;

/// A sample image reduced to palette indices.
#[derive(Debug, Clone)]
pub struct PalettedImage {
    grid: Grid<ColorIndex>,
    palette: Palette,
}

impl PalettedImage {
    /// Builds the palette by scanning `pixels` in row-major order; the first
    /// occurrence of a color decides its index.
    pub fn from_pixels(size: Size, pixels: &[Rgba]) -> Result<Self, Error> {
        assert_eq!(pixels.len(), size.count());
        let mut palette = Palette::new();
        let mut data = Vec::with_capacity(pixels.len());
        for &pixel in pixels {
            let index = match palette.iter().position(|&color| color == pixel) {
                Some(index) => index,
                None => {
                    if palette.len() == MAX_COLORS {
                        return Err(Error::PaletteOverflow);
                    }
                    palette.push(pixel);
                    palette.len() - 1
                }
            };
            data.push(index as ColorIndex);
        }
        let width = size.width();
        let grid = Grid::new_fn(size, |coord| {
            data[(coord.y as u32 * width + coord.x as u32) as usize]
        });
        Ok(Self { grid, palette })
    }

    pub fn size(&self) -> Size {
        self.grid.size()
    }

    pub fn width(&self) -> u32 {
        self.grid.size().width()
    }

    pub fn height(&self) -> u32 {
        self.grid.size().height()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn at(&self, coord: Coord) -> ColorIndex {
        *self.grid.get_checked(coord)
    }

    /// Toroidal access, used when extracting patterns from periodic samples.
    pub fn at_wrapped(&self, coord: Coord) -> ColorIndex {
        *self.grid.get_tiled(coord)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const BLACK: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
    const WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    #[test]
    fn first_occurrence_wins() {
        let image = PalettedImage::from_pixels(
            Size::new(2, 2),
            &[WHITE, BLACK, WHITE, WHITE],
        )
        .unwrap();
        assert_eq!(image.palette(), &vec![WHITE, BLACK]);
        assert_eq!(image.at(Coord::new(0, 0)), 0);
        assert_eq!(image.at(Coord::new(1, 0)), 1);
        assert_eq!(image.at(Coord::new(1, 1)), 0);
    }

    #[test]
    fn wrapped_access() {
        let image = PalettedImage::from_pixels(
            Size::new(2, 2),
            &[WHITE, BLACK, BLACK, WHITE],
        )
        .unwrap();
        assert_eq!(image.at_wrapped(Coord::new(2, 0)), 0);
        assert_eq!(image.at_wrapped(Coord::new(3, 1)), 0);
        assert_eq!(image.at_wrapped(Coord::new(2, 3)), 1);
    }

    #[test]
    fn palette_overflow() {
        let pixels: Vec<Rgba> = (0..=256u32)
            .map(|i| Rgba {
                r: (i % 256) as u8,
                g: (i / 256) as u8,
                b: 0,
                a: 255,
            })
            .chain(std::iter::repeat(BLACK))
            .take(18 * 16)
            .collect();
        assert!(matches!(
            PalettedImage::from_pixels(Size::new(16, 18), &pixels),
            Err(Error::PaletteOverflow),
        ));
    }
}
