mod config;
mod jobs;
mod recorder;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::jobs::{run_job_file, Options};

/// Generate textures and tile maps with Wave Function Collapse.
#[derive(Parser)]
#[command(name = "wfc", version, about)]
struct Args {
    /// Export GIF animations of the collapse process
    #[arg(long)]
    gif: bool,

    /// Job files to run
    #[arg(value_name = "JOB_FILE")]
    jobs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = Options {
        export_gif: args.gif,
    };
    if options.export_gif {
        info!("enabled GIF exporting");
    }

    let job_files = if args.jobs.is_empty() {
        vec![PathBuf::from("samples.cfg")]
    } else {
        args.jobs
    };
    for path in &job_files {
        run_job_file(&options, path)?;
    }
    Ok(())
}
