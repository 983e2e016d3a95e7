//! Background removal HTTP server
//!
//! Parses flags, loads the model, and serves until Ctrl-C or SIGTERM.

use super::config::CliConfigBuilder;
use crate::{
    api::Application,
    config::{DEFAULT_PORT, MAX_FILE_SIZE},
    tracing_config::{init_server_tracing, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

/// Background removal HTTP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-server")]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "BGREMOVE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Inference backend
    #[arg(short, long, value_enum, env = "BGREMOVE_BACKEND", default_value_t = CliBackend::Tract)]
    pub backend: CliBackend,

    /// ONNX segmentation model (required for the tract backend)
    #[arg(short, long, env = "BGREMOVE_MODEL", value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Square model input size in pixels [default: sidecar config or 1024]
    #[arg(long, value_name = "PIXELS")]
    pub input_size: Option<u32>,

    /// Maximum upload size in bytes
    #[arg(long, env = "BGREMOVE_MAX_FILE_SIZE", default_value_t = MAX_FILE_SIZE, value_name = "BYTES")]
    pub max_file_size: usize,

    /// Timeout for downloading remote images
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    pub fetch_timeout: u64,

    /// Do not serve the HTML demo page on /
    #[arg(long, env = "BGREMOVE_NO_DEMO")]
    pub no_demo: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackend {
    /// Pure Rust ONNX inference
    Tract,
    /// Colour-key mask, no model file needed
    Mock,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => Self::Console,
            CliLogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => Self::Json,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_server_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::server_config(&cli).context("Failed to build configuration")?;

    info!(
        backend = ?cli.backend,
        model = ?cli.model,
        max_file_size = config.upload.max_file_size,
        "Starting background removal server"
    );

    // Model loading is CPU bound
    let remover = {
        let cli_backend = cli.backend;
        let model = cli.model.clone();
        let input_size = cli.input_size;
        tokio::task::spawn_blocking(move || {
            CliConfigBuilder::build_remover(cli_backend, model.as_deref(), input_size)
        })
        .await
        .context("Model loading task failed")?
        .context("Failed to initialize background remover")?
    };

    let app = Application::build(config, remover)
        .await
        .context("Failed to start HTTP server")?;

    app.run_with_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
