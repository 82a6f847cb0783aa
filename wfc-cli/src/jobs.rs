use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use wfc::retry::{NumTimes, Retry};
use wfc::{
    create_wave, extract_patterns, run, Model, Outcome, OverlappingModel, Size, TileModel, Wave,
};
use wfc_image::{load_sample, load_tile_bitmap, render_overlapping, scroll_diagonally, TileBitmaps};

use crate::config::{JobFile, OverlappingJob, TileSetConfig, TiledJob};
use crate::recorder::{GifRecorder, GIF_END_PAUSE, GIF_FRAME_DELAY, GIF_INTERVAL};

/// Retries per screenshot when a solve ends in contradiction.
const MAX_RETRIES: usize = 10;
const OUTPUT_DIR: &str = "output";

pub struct Options {
    pub export_gif: bool,
}

pub fn run_job_file(options: &Options, path: &Path) -> Result<()> {
    info!("running all jobs in {}", path.display());
    let file =
        File::open(path).with_context(|| format!("opening job file {}", path.display()))?;
    let jobs: JobFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing job file {}", path.display()))?;

    for (name, job) in &jobs.overlapping {
        info!("overlapping {}", name);
        run_overlapping(options, &jobs.image_dir, name, job)
            .with_context(|| format!("job '{}'", name))?;
    }
    for (name, job) in &jobs.tiled {
        info!("tiled {}", name);
        run_tiled(options, &jobs.image_dir, name, job)
            .with_context(|| format!("job '{}'", name))?;
    }
    Ok(())
}

fn run_overlapping(
    options: &Options,
    image_dir: &str,
    name: &str,
    job: &OverlappingJob,
) -> Result<()> {
    let path = Path::new(image_dir).join(&job.image);
    let sample = load_sample(&path)
        .with_context(|| format!("loading sample image {}", path.display()))?;
    info!("palette size: {}", sample.palette().len());
    let extraction =
        extract_patterns(&sample, job.n, job.periodic_in, job.symmetry, job.foundation)?;
    info!(
        "found {} unique patterns in sample image",
        extraction.prevalence.len(),
    );
    let model = OverlappingModel::new(
        &extraction.prevalence,
        extraction.foundation,
        sample.palette().clone(),
        job.n,
        job.periodic_out,
        Size::new(job.width, job.height),
    )?;
    run_and_write(options, name, job.screenshots, job.limit, &model, |wave| {
        render_overlapping(&model, wave)
    })
}

fn run_tiled(options: &Options, image_dir: &str, name: &str, job: &TiledJob) -> Result<()> {
    let root = Path::new(image_dir).join(&job.subdir);
    let manifest_path = root.join("data.cfg");
    let file = File::open(&manifest_path)
        .with_context(|| format!("opening tile manifest {}", manifest_path.display()))?;
    let manifest: TileSetConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing tile manifest {}", manifest_path.display()))?;

    let tile_set = manifest.tile_set()?;
    let model = TileModel::new(
        &tile_set,
        job.subset.as_deref(),
        Size::new(job.width, job.height),
        job.periodic,
    )?;
    let bitmaps = TileBitmaps::load(&model, manifest.tile_size, manifest.unique, |tile_name| {
        load_tile_bitmap(&root.join(format!("{}.bmp", tile_name)))
    })
    .with_context(|| format!("loading tile bitmaps from {}", root.display()))?;

    run_and_write(options, name, job.screenshots, job.limit, &model, |wave| {
        bitmaps.render(&model, wave)
    })
}

fn run_and_write<M, F>(
    options: &Options,
    name: &str,
    screenshots: usize,
    limit: usize,
    model: &M,
    render: F,
) -> Result<()>
where
    M: Model,
    F: Fn(&Wave) -> RgbaImage,
{
    fs::create_dir_all(OUTPUT_DIR).context("creating output directory")?;
    let mut rng = XorShiftRng::seed_from_u64(rand::thread_rng().gen());

    for index in 0..screenshots {
        let (outcome, wave) = if options.export_gif {
            collapse_recording(name, index, limit, model, &render, &mut rng)?
        } else {
            NumTimes(MAX_RETRIES).retry(model, limit, &mut rng)
        };
        match outcome {
            Outcome::Success => {
                let out_path = format!("{}/{}_{}.png", OUTPUT_DIR, name, index);
                render(&wave)
                    .save(&out_path)
                    .with_context(|| format!("writing image to {}", out_path))?;
            }
            Outcome::Fail => warn!(
                "{}_{}: still contradictory after {} retries",
                name, index, MAX_RETRIES,
            ),
            Outcome::Unfinished => warn!("{}_{}: iteration limit reached", name, index),
        }
    }
    Ok(())
}

/// The GIF path runs its own attempt loop: each attempt re-records the file
/// from scratch, so the animation that survives is the attempt that settled
/// the outcome.
fn collapse_recording<M, F>(
    name: &str,
    index: usize,
    limit: usize,
    model: &M,
    render: &F,
    rng: &mut XorShiftRng,
) -> Result<(Outcome, Wave)>
where
    M: Model,
    F: Fn(&Wave) -> RgbaImage,
{
    let gif_path = format!("{}/{}_{}.gif", OUTPUT_DIR, name, index);
    let mut attempts = MAX_RETRIES;
    loop {
        let mut wave = create_wave(model);
        let initial = render(&wave);
        let mut recorder =
            GifRecorder::create(Path::new(&gif_path), initial.width(), initial.height())?;

        let outcome = run(model, &mut wave, limit, rng, |iteration, wave| {
            if iteration % GIF_INTERVAL == 0 {
                recorder.frame(render(wave), GIF_FRAME_DELAY);
            }
        });

        if outcome != Outcome::Unfinished {
            // hold the final state, then scroll periodic outputs diagonally
            recorder.frame(render(&wave), GIF_END_PAUSE);
            if model.periodic_out() {
                let mut image = render(&wave);
                for _ in 0..model.size().width() {
                    image = scroll_diagonally(&image);
                    recorder.frame(image.clone(), GIF_FRAME_DELAY);
                }
            }
        }
        recorder.finish()?;

        match outcome {
            Outcome::Fail if attempts > 0 => {
                attempts -= 1;
                continue;
            }
            outcome => return Ok((outcome, wave)),
        }
    }
}
