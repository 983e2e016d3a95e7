//! Tract backend implementation for background removal models
//!
//! Runs an ONNX segmentation model with Tract, a pure Rust neural network
//! inference library with no external dependencies. The optimized plan is
//! immutable once built and `run` only borrows it, so a single backend serves
//! all concurrent requests.

use crate::error::{BgRemovalError, Result};
use crate::inference::InferenceBackend;
use crate::models::{ModelInfo, ModelSpec, PreprocessingConfig};
use ndarray::Array4;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant crate for cross-platform time compatibility
use instant::{Duration, Instant};

/// Tract backend for running segmentation models using pure Rust inference
#[derive(Debug, Default)]
pub struct TractBackend {
    model: Option<TractModel>,
    spec: Option<ModelSpec>,
    size_bytes: usize,
}

impl TractBackend {
    /// Create a new uninitialized Tract backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and initialize the model using Tract
    fn load_model(&mut self, spec: &ModelSpec) -> Result<Duration> {
        let model_load_start = Instant::now();
        let model_data = spec.load_model()?;
        let (batch, channels, height, width) = spec.input_shape();

        info!(
            model = %spec.display_name(),
            size_mb = %format!("{:.2}", model_data.len() as f64 / (1024.0 * 1024.0)),
            input = ?spec.input_shape(),
            "Initializing Tract backend"
        );

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(&model_data))
            .map_err(|e| BgRemovalError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([batch, channels, height, width]).into())
            .map_err(|e| BgRemovalError::model(format!("Failed to pin input shape: {e}")))?
            .into_optimized()
            .map_err(|e| BgRemovalError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| BgRemovalError::model(format!("Failed to create runnable model: {e}")))?;

        self.model = Some(model);
        self.spec = Some(spec.clone());
        self.size_bytes = model_data.len();

        let model_load_time = model_load_start.elapsed();
        info!(
            elapsed_ms = model_load_time.as_millis() as u64,
            "Tract backend initialized"
        );

        Ok(model_load_time)
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self, spec: &ModelSpec) -> Result<Option<Duration>> {
        if self.model.is_some() {
            return Ok(None);
        }

        let model_load_time = self.load_model(spec)?;
        Ok(Some(model_load_time))
    }

    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| BgRemovalError::inference("Tract model not initialized"))?;

        debug!(input = ?input.shape(), "Running Tract inference");
        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());
        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| BgRemovalError::inference(format!("Tract inference failed: {e}")))?;

        // Salient-object models emit several side outputs; the first is the fused mask
        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BgRemovalError::inference("No output tensor found"))?
            .into_arc_tensor();

        let output_data = output_tensor.to_array_view::<f32>().map_err(|e| {
            BgRemovalError::inference(format!("Failed to convert output tensor: {e}"))
        })?;

        let output_shape = output_data.shape().to_vec();
        let [n, c, h, w] = output_shape[..] else {
            return Err(BgRemovalError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        };

        let output_array =
            Array4::from_shape_vec((n, c, h, w), output_data.iter().copied().collect()).map_err(
                |e| BgRemovalError::inference(format!("Failed to reshape output tensor: {e}")),
            )?;

        debug!(
            output = ?output_array.shape(),
            elapsed_ms = inference_start.elapsed().as_millis() as u64,
            "Tract inference completed"
        );

        Ok(output_array)
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        self.spec
            .as_ref()
            .map(|spec| spec.preprocessing.clone())
            .ok_or_else(|| BgRemovalError::internal("Tract backend not initialized"))
    }

    fn model_info(&self) -> Result<ModelInfo> {
        let spec = self
            .spec
            .as_ref()
            .ok_or_else(|| BgRemovalError::internal("Tract backend not initialized"))?;
        Ok(ModelInfo {
            name: spec.display_name(),
            size_bytes: self.size_bytes,
            input_shape: spec.input_shape(),
            output_shape: spec.output_shape(),
        })
    }

    fn is_initialized(&self) -> bool {
        self.model.is_some()
    }
}
