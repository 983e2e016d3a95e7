//! Mock backend implementation for testing and model-free demos

use crate::error::{BgRemovalError, Result};
use crate::inference::InferenceBackend;
use crate::models::{ModelInfo, ModelSpec, PreprocessingConfig};
use instant::Duration;
use ndarray::Array4;

/// Mock backend for testing and debugging purposes
///
/// Produces a colour-key mask instead of running a model: a pixel is
/// background when its normalized colour is within `tolerance` of the
/// top-left pixel of the input tensor. Deterministic, so tests can assert
/// exact alpha values.
#[derive(Debug, Clone)]
pub struct MockBackend {
    preprocessing: PreprocessingConfig,
    tolerance: f32,
}

impl MockBackend {
    /// Create a new mock backend with the default 1024x1024 input
    #[must_use]
    pub fn new() -> Self {
        Self {
            preprocessing: PreprocessingConfig::default(),
            tolerance: 0.25,
        }
    }

    /// Create a mock backend with a custom square input size
    #[must_use]
    pub fn with_target_size(size: u32) -> Self {
        Self {
            preprocessing: PreprocessingConfig::square(size),
            ..Self::new()
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(&mut self, spec: &ModelSpec) -> Result<Option<Duration>> {
        self.preprocessing = spec.preprocessing.clone();
        Ok(None)
    }

    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let (n, c, h, w) = input.dim();
        if c != 3 || h == 0 || w == 0 {
            return Err(BgRemovalError::inference(format!(
                "Mock backend expects a (N, 3, H, W) tensor, got {:?}",
                input.shape()
            )));
        }

        let mut output = Array4::<f32>::zeros((n, 1, h, w));

        for batch in 0..n {
            let key: Vec<f32> = (0..3)
                .map(|ch| input.get([batch, ch, 0, 0]).copied().unwrap_or(0.0))
                .collect();

            for y in 0..h {
                for x in 0..w {
                    let distance = (0..3)
                        .map(|ch| {
                            let value = input.get([batch, ch, y, x]).copied().unwrap_or(0.0);
                            let k = key.get(ch).copied().unwrap_or(0.0);
                            (value - k).abs()
                        })
                        .fold(0.0_f32, f32::max);

                    if let Some(elem) = output.get_mut([batch, 0, y, x]) {
                        *elem = if distance > self.tolerance { 1.0 } else { 0.0 };
                    }
                }
            }
        }

        Ok(output)
    }

    fn preprocessing_config(&self) -> Result<PreprocessingConfig> {
        Ok(self.preprocessing.clone())
    }

    fn model_info(&self) -> Result<ModelInfo> {
        let size = self.preprocessing.target_size[0] as usize;
        Ok(ModelInfo {
            name: "Mock Backend".to_string(),
            size_bytes: 0,
            input_shape: (1, 3, size, size),
            output_shape: (1, 1, size, size),
        })
    }

    fn is_initialized(&self) -> bool {
        true // Mock backend is always "initialized"
    }
}
