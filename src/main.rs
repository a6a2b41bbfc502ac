mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::str::FromStr;

use cli::Cli;
use inktrace::audio::decode::decode_track;
use inktrace::audio::spectrum::{analyze_track, Resolution, SilentSnapshots, SnapshotSource};
use inktrace::config;
use inktrace::engine::motion::Variant;
use inktrace::engine::session::Session;
use inktrace::engine::Viewport;
use inktrace::render::raster::RasterCanvas;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detected file
    let config_path = cli.config.clone().or_else(config::discover);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when the CLI is at its default
            if cli.width == 960 { cli.width = cfg.canvas.width; }
            if cli.height == 640 { cli.height = cfg.canvas.height; }
            if cli.fps == 60 { cli.fps = cfg.canvas.fps; }
            if cli.variant == "drift" { cli.variant = cfg.engine.variant; }
            if cli.resolution == "full" { cli.resolution = cfg.analysis.resolution; }
            if cli.smoothing == 0.8 { cli.smoothing = cfg.analysis.smoothing; }
            if cli.seed.is_none() { cli.seed = cfg.engine.seed; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let variant = Variant::from_str(&cli.variant).map_err(anyhow::Error::msg)?;
    let resolution = Resolution::from_str(&cli.resolution).map_err(anyhow::Error::msg)?;

    log::info!("inktrace - audio-reactive ink trail renderer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Variant: {:?}", variant);
    log::info!("Canvas: {}x{} @ {}fps", cli.width, cli.height, cli.fps);

    // 1. Decode audio
    let track = decode_track(input)?;
    let mut duration = track.duration_secs();
    if let Some(limit) = cli.limit {
        duration = duration.min(limit);
    }

    // 2. Precompute one snapshot per frame. A failed analyzer setup is not
    // fatal: the session still runs, it just hears silence.
    let source: Box<dyn SnapshotSource> =
        match analyze_track(&track, cli.fps, resolution, cli.smoothing) {
            Ok(spectrum) => Box::new(spectrum),
            Err(err) => {
                log::warn!("Spectral analysis unavailable ({err}); continuing without an analyzer");
                Box::new(SilentSnapshots::new(resolution.bin_count()))
            }
        };

    // 3. Session and canvas
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("Seed: {}", seed);

    let viewport = Viewport::new(cli.width as f32, cli.height as f32);
    let mut session = Session::new(variant, viewport, source.bin_count(), seed)?;
    let mut canvas = RasterCanvas::new(cli.width, cli.height);

    // 4. Drive the session over the track at a fixed frame rate
    let total_frames = (duration * cli.fps as f32).ceil() as usize;
    let dt = 1.0 / cli.fps as f32;
    let track_duration = track.duration_secs();

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut trace: Vec<inktrace::engine::bands::BandEnergy> = Vec::new();
    session.start();
    for frame in 0..total_frames {
        let progress = (frame as f32 * dt / track_duration).min(1.0);
        let bands = session.frame(source.snapshot_at(frame), dt, Some(progress), &mut canvas);
        if cli.band_trace.is_some() {
            if let Some(bands) = bands {
                trace.push(bands);
            }
        }
        pb.set_position(frame as u64 + 1);
    }
    session.stop();
    pb.finish_with_message("Drawing complete");

    if session.variant() == Variant::Grid {
        log::info!("Decorative shapes emitted: {}", session.filled_shapes().len());
    }

    // 5. Optional band trace for tuning
    if let Some(ref path) = cli.band_trace {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create band trace file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &trace).context("Failed to write band trace")?;
        log::info!("Band trace: {} frames to {}", trace.len(), path.display());
    }

    // 6. Save the finished canvas
    let image = image::RgbaImage::from_raw(cli.width, cli.height, canvas.into_pixels())
        .context("Canvas pixel buffer has unexpected size")?;
    image
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
