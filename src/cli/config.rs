//! Conversion from CLI arguments to server configuration and remover

use crate::backends::MockBackend;
use crate::cli::main_impl::{Cli, CliBackend};
use crate::{
    config::ServerConfig,
    models::{ModelSpec, DEFAULT_TARGET_SIZE},
    processor::{BackendType, BackgroundRemovalProcessor},
    remover::BackgroundRemover,
};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the server configuration from CLI arguments
    pub(crate) fn server_config(cli: &Cli) -> Result<ServerConfig> {
        ServerConfig::builder()
            .host(cli.host)
            .port(cli.port)
            .max_file_size(cli.max_file_size)
            .fetch_timeout(Duration::from_secs(cli.fetch_timeout))
            .serve_demo(!cli.no_demo)
            .build()
            .context("Invalid server configuration")
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.backend == CliBackend::Tract && cli.model.is_none() {
            bail!("--model (or BGREMOVE_MODEL) is required for the tract backend");
        }
        if let Some(model) = &cli.model {
            if cli.backend == CliBackend::Tract && !model.is_file() {
                bail!("Model file not found: {}", model.display());
            }
        }
        if cli.input_size == Some(0) {
            bail!("--input-size must be greater than zero");
        }
        if cli.fetch_timeout == 0 {
            bail!("--fetch-timeout must be at least one second");
        }
        Ok(())
    }

    /// Create and initialize the background remover
    pub(crate) fn build_remover(
        backend: CliBackend,
        model: Option<&Path>,
        input_size: Option<u32>,
    ) -> Result<Arc<dyn BackgroundRemover>> {
        let processor = match (backend, model) {
            (CliBackend::Tract, Some(path)) => {
                let spec = ModelSpec::from_path(path, input_size)
                    .with_context(|| format!("Failed to describe model {}", path.display()))?;
                BackgroundRemovalProcessor::new(BackendType::Tract, &spec)?
            },
            (CliBackend::Tract, None) => {
                bail!("--model is required for the tract backend")
            },
            (CliBackend::Mock, Some(path)) => {
                let spec = ModelSpec::from_path(path, input_size)?;
                BackgroundRemovalProcessor::new(BackendType::Mock, &spec)?
            },
            (CliBackend::Mock, None) => {
                let backend =
                    MockBackend::with_target_size(input_size.unwrap_or(DEFAULT_TARGET_SIZE));
                BackgroundRemovalProcessor::from_initialized(Box::new(backend))?
            },
        };

        Ok(Arc::new(processor))
    }
}
