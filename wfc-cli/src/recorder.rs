use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

/// Save a frame every this many observations.
pub const GIF_INTERVAL: usize = 16;
/// Centiseconds between animation frames.
pub const GIF_FRAME_DELAY: u16 = 1;
/// Centiseconds to hold the final state.
pub const GIF_END_PAUSE: u16 = 200;

/// Streams RGBA frames into an animated GIF. Encoding errors are latched and
/// surfaced by `finish`, so the solve's snapshot hook stays infallible.
pub struct GifRecorder {
    encoder: gif::Encoder<File>,
    error: Option<gif::EncodingError>,
}

impl GifRecorder {
    pub fn create(path: &Path, width: u32, height: u32) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating gif file {}", path.display()))?;
        let mut encoder = gif::Encoder::new(file, width as u16, height as u16, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        Ok(Self {
            encoder,
            error: None,
        })
    }

    pub fn frame(&mut self, image: RgbaImage, delay: u16) {
        if self.error.is_some() {
            return;
        }
        let (width, height) = image.dimensions();
        let mut data = image.into_raw();
        let mut frame = gif::Frame::from_rgba_speed(width as u16, height as u16, &mut data, 10);
        frame.delay = delay;
        if let Err(error) = self.encoder.write_frame(&frame) {
            self.error = Some(error);
        }
    }

    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(error) => Err(error).context("encoding gif"),
            None => Ok(()),
        }
    }
}
