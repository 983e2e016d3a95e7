#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Background Removal Service
//!
//! An HTTP service that strips image backgrounds with an ONNX segmentation
//! model run by Tract, plus the library pieces it is built from.
//!
//! ## Features
//!
//! - **HTTP API**: multipart upload, fetch by URL, health probe and a demo page
//! - **Pluggable removal**: everything behind the [`BackgroundRemover`] trait
//! - **Pure Rust inference**: Tract backend, no native runtime needed
//! - **Format aware**: PNG, JPEG, WebP and TIFF output; alpha is flattened onto
//!   white for formats without transparency
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_server::{
//!     api::Application, BackendType, BackgroundRemovalProcessor, ModelSpec, ServerConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let spec = ModelSpec::from_path("models/u2net.onnx", Some(320))?;
//! let processor = BackgroundRemovalProcessor::new(BackendType::Tract, &spec)?;
//!
//! let config = ServerConfig::builder().port(8080).build()?;
//! let app = Application::build(config, Arc::new(processor)).await?;
//! app.run_until_stopped().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Removing a background without the server
//!
//! ```rust,no_run
//! use bgremove_server::{
//!     config::OutputFormat, pipeline::RemovalPipeline, BackendType,
//!     BackgroundRemovalProcessor, ModelSpec,
//! };
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let spec = ModelSpec::from_path("models/u2net.onnx", None)?;
//! let processor = BackgroundRemovalProcessor::new(BackendType::Tract, &spec)?;
//! let pipeline = RemovalPipeline::new(Arc::new(processor));
//!
//! let input = std::fs::read("photo.jpg")?;
//! let processed = pipeline.process(&input, OutputFormat::Png)?;
//! std::fs::write("photo.png", &processed.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): Tract inference backend
//! - `cli` (default): server binary (argument parsing, subscriber setup)
//! - `webp-support` (default): WebP decoding and encoding
//! - `tracing-json`: JSON log output for the server binary

pub mod api;
pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod remover;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

pub use backends::MockBackend;
#[cfg(feature = "tract")]
pub use backends::TractBackend;
pub use config::{OutputFormat, ReturnType, ServerConfig, UploadPolicy};
pub use error::{BgRemovalError, Result};
pub use inference::InferenceBackend;
pub use models::{ModelSpec, PreprocessingConfig};
pub use pipeline::{ProcessedImage, RemovalPipeline};
pub use processor::{BackendType, BackgroundRemovalProcessor};
pub use remover::BackgroundRemover;
pub use types::SegmentationMask;
