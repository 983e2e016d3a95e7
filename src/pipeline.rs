//! Per-request image pipeline: decode, flatten, remove, encode
//!
//! Synchronous and CPU-bound. The HTTP layer runs it on the blocking pool.

use crate::{
    config::OutputFormat,
    error::Result,
    remover::BackgroundRemover,
    services::{ImageIOService, OutputFormatHandler},
};
use instant::Instant;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Encoded result of one removal
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Format `bytes` is encoded in
    pub format: OutputFormat,
    /// Width and height of the decoded input
    pub original_size: (u32, u32),
}

impl ProcessedImage {
    /// MIME type of `bytes`
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        OutputFormatHandler::mime_type(self.format)
    }
}

/// Runs raw image bytes through the background remover
#[derive(Clone)]
pub struct RemovalPipeline {
    remover: Arc<dyn BackgroundRemover>,
}

impl std::fmt::Debug for RemovalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalPipeline")
            .field("remover", &self.remover.name())
            .finish()
    }
}

impl RemovalPipeline {
    #[must_use]
    pub fn new(remover: Arc<dyn BackgroundRemover>) -> Self {
        Self { remover }
    }

    /// Remove the background from encoded image `bytes` and re-encode as `format`
    ///
    /// When `format` cannot hold transparency, an input with alpha is first
    /// flattened onto white, and the remover output is flattened again before
    /// encoding so transparent pixels come out white.
    ///
    /// # Errors
    /// - Bytes are not a decodable image
    /// - Remover failure
    /// - Encoder failure
    #[instrument(skip(self, bytes), fields(input_bytes = bytes.len(), format = %format))]
    pub fn process(&self, bytes: &[u8], format: OutputFormat) -> Result<ProcessedImage> {
        let start = Instant::now();

        let mut image = ImageIOService::decode(bytes)?;
        let original_size = (image.width(), image.height());
        debug!(
            width = original_size.0,
            height = original_size.1,
            color = ?image.color(),
            "Decoded input"
        );

        if OutputFormatHandler::needs_flattening(&image, format) {
            debug!("Flattening input alpha onto white");
            image = OutputFormatHandler::flatten_onto_white(&image);
        }

        let removed = self.remover.remove(&image)?;
        let prepared = OutputFormatHandler::prepare_for_encoding(removed, format);
        let bytes = ImageIOService::encode(&prepared, format)?;

        debug!(
            output_bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Removal pipeline completed"
        );

        Ok(ProcessedImage {
            bytes,
            format,
            original_size,
        })
    }
}
