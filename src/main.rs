use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use pathtracer::{
    init_logger, Camera, FileRenderJob, OutputFormat, RenderSettings, Resolution, Scene, Seed,
};

mod cli;

use cli::Args;

fn resolution(args: &Args) -> anyhow::Result<Resolution> {
    if let Some(name) = &args.preset {
        return Resolution::find(name)
            .ok_or_else(|| anyhow!("unknown resolution preset '{}'", name));
    }

    Ok(match (args.width, args.height) {
        (Some(width), Some(height)) => Resolution::custom(width, height),
        _ => Resolution::default(),
    })
}

fn camera(args: &Args) -> Camera {
    let mut camera = Camera::default();
    if let Some(position) = args.position {
        camera = camera.with_position(position);
    }
    if let Some(target) = args.target {
        camera = camera.with_target(target);
    }
    if let Some(fov) = args.fov {
        camera = camera.with_vertical_fov(fov);
    }
    camera
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    let format = match args.format {
        Some(format) => format.into(),
        None => OutputFormat::from_path(&args.output).unwrap_or_default(),
    };

    let settings = RenderSettings {
        resolution: resolution(&args)?,
        output_path: args.output.clone(),
        format,
        frames: args.frames,
        seed: args.seed.map_or(Seed::Entropy, Seed::Fixed),
    };

    let started = Instant::now();
    let job = FileRenderJob::spawn(settings, Scene::demo(), camera(&args));

    let progress = ProgressBar::new(100);
    progress.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}% ETA: {eta}")?);
    while !job.is_finished() {
        progress.set_position(job.progress() as u64);
        thread::sleep(Duration::from_millis(100));
    }
    progress.set_position(job.progress() as u64);
    progress.finish();

    let path = job.join().context("rendering failed")?;

    info!("saved {} ({:.2}s)", path.display(), started.elapsed().as_secs_f32());
    Ok(())
}
