//! spectrum-scope - live frequency spectrum of an audio stream
//!
//! Captures from the default input device (or a WAV file / test tone) and
//! draws the lower third of each channel's spectrum as a line strip.

use anyhow::{Context, Result};
use log::{error, info};
use std::process::ExitCode;

use spectrum_scope::audio::{AudioSource, DeviceSource, SineSource, WavSource};
use spectrum_scope::cli::{self, Resolution, SourceSelection};
use spectrum_scope::frame::FrameLoop;
use spectrum_scope::params::{Configuration, DisplayTuning, RenderConfig};
use spectrum_scope::rendering::{WindowRenderer, DEFAULT_SHADER};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let resolution = cli::resolve(std::env::args_os()).unwrap_or_else(|err| err.exit());

    match run(resolution) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(resolution: Resolution) -> Result<()> {
    let config = resolution.config;
    info!(
        "Attempting to open a {} stream at {}Hz with a transform window of {}",
        config.mode, config.sample_rate, config.transform_size
    );

    let shader_source = match &resolution.shader {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shader {}", path.display()))?,
        None => DEFAULT_SHADER.to_string(),
    };

    match resolution.source {
        SourceSelection::Device => {
            let source = DeviceSource::open(&config).context("Failed to open capture device")?;
            run_loop(config, source, &shader_source)
        }
        SourceSelection::Wav(path) => {
            let source = WavSource::open(&path, &config)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            run_loop(config, source, &shader_source)
        }
        SourceSelection::Sine(hz) => {
            info!("Audio: {}Hz test tone", hz);
            let source = SineSource::new(hz, config.sample_rate, config.channels()).paced();
            run_loop(config, source, &shader_source)
        }
    }
}

fn run_loop<A: AudioSource>(config: Configuration, source: A, shader_source: &str) -> Result<()> {
    let tuning = DisplayTuning::default();
    let vertex_capacity = config.channels() * tuning.displayed_bins(config.transform_size);

    let renderer = WindowRenderer::new(&RenderConfig::default(), shader_source, vertex_capacity)
        .context("Failed to initialise renderer")?;

    println!("\nspectrum-scope is running!");
    println!("Press ESC to quit\n");

    let mut frame_loop = FrameLoop::new(config, tuning, source, renderer);
    let stats = frame_loop.run().context("Frame loop aborted")?;

    info!("Clean shutdown after {} frames", stats.frames);
    Ok(())
}
