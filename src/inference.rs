//! Inference backend abstraction

use crate::{
    error::Result,
    models::{ModelInfo, ModelSpec, PreprocessingConfig},
};
use ndarray::Array4;

// Use instant crate for cross-platform time compatibility
use instant::Duration;

/// Trait for inference backends
///
/// Backends are initialized once at startup and then shared between
/// concurrent requests, so `infer` only borrows `self`.
pub trait InferenceBackend: Send + Sync {
    /// Load the model described by `spec`
    ///
    /// Returns the model load time, or `None` if the backend was already
    /// initialized.
    ///
    /// # Errors
    /// - Model file missing or unreadable
    /// - Model parsing or optimization failures
    fn initialize(&mut self, spec: &ModelSpec) -> Result<Option<Duration>>;

    /// Run inference on an NCHW input tensor, returning a `(1, 1, H, W)` mask
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    /// - Unexpected output tensor shape
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Preprocessing parameters the model expects
    ///
    /// # Errors
    /// - Backend not initialized
    fn preprocessing_config(&self) -> Result<PreprocessingConfig>;

    /// Model information for this backend
    ///
    /// # Errors
    /// - Backend not initialized
    fn model_info(&self) -> Result<ModelInfo>;

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;
}
