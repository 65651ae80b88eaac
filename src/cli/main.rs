//! Subject cutout CLI tool
//!
//! Command-line interface for cutting a detected subject out of a photograph
//! or resizing an image.

use super::config::CliConfigBuilder;
use crate::{default_cutout_path, models::ModelTier, resize::resize_image};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Subject cutout CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgcutout")]
pub struct Cli {
    /// Input image file
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output file [default: <INPUT stem>_no_bg.png]
    #[arg(value_name = "OUTPUT")]
    pub output_positional: Option<PathBuf>,

    /// Output file (takes precedence over the positional OUTPUT)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Model size tier
    #[arg(long, value_enum, default_value_t = ModelTier::Nano)]
    pub model_size: ModelTier,

    /// Confidence threshold for keeping detections (0.0-1.0)
    #[arg(long, value_parser = confidence_in_range, default_value_t = crate::config::DEFAULT_CONFIDENCE_THRESHOLD)]
    pub conf: f32,

    /// Directory containing .onnx model files
    #[arg(long, value_name = "PATH", default_value = crate::config::DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resize an image instead of removing its background
    Resize {
        /// Input image file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Target width in pixels (requires --height)
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels (requires --width)
        #[arg(long)]
        height: Option<u32>,

        /// Uniform scale percentage (e.g. 50 halves both dimensions)
        #[arg(long)]
        scale: Option<f32>,
    },
}

/// Reject confidence values outside [0.0, 1.0] at parse time
fn confidence_in_range(raw: &str) -> std::result::Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "confidence threshold must be between 0.0 and 1.0, got {raw}"
        ))
    }
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    if let Some(Command::Resize {
        input,
        output,
        width,
        height,
        scale,
    }) = &cli.command
    {
        let spec = CliConfigBuilder::size_spec(*width, *height, *scale)
            .context("Invalid resize arguments")?;
        let written = resize_image(input, output, &spec)
            .with_context(|| format!("Failed to resize {}", input.display()))?;
        info!("Resized {} -> {}", input.display(), written.display());
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        anyhow::bail!("An input image is required");
    };

    // The -o flag wins over the positional output when both are given
    let output = cli
        .output
        .clone()
        .or_else(|| cli.output_positional.clone())
        .unwrap_or_else(|| default_cutout_path(&input));

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!("Starting subject cutout");
    info!("Input: {}", input.display());
    info!(
        "Model tier: {}, confidence threshold: {}",
        config.model_tier, config.confidence_threshold
    );

    let start_time = Instant::now();
    let written = crate::remove_background(&input, &output, &config)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    info!(
        "Wrote {} in {:.2}s",
        written.display(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = match verbose_count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bgcutout={default_directive}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose_count >= 2)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
