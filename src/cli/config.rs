//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::{config::RemovalConfig, resize::SizeSpec};
use anyhow::{Context, Result};

/// Convert CLI arguments to a unified [`RemovalConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build a [`RemovalConfig`] from CLI arguments
    ///
    /// The clap value parser already bounds `--conf`; the builder re-checks
    /// so programmatic callers get the same rejection.
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        RemovalConfig::builder()
            .model_tier(cli.model_size)
            .confidence_threshold(cli.conf)
            .model_dir(cli.model_dir.clone())
            .build()
            .context("Invalid configuration")
    }

    /// Resolve `--width`/`--height`/`--scale` into a [`SizeSpec`]
    pub(crate) fn size_spec(
        width: Option<u32>,
        height: Option<u32>,
        scale: Option<f32>,
    ) -> Result<SizeSpec> {
        SizeSpec::from_parts(width, height, scale).context("Invalid size arguments")
    }
}
