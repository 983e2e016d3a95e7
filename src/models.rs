//! Segmentation model description and preprocessing parameters

use crate::error::{BgRemovalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the optional HuggingFace-style preprocessing sidecar
pub const PREPROCESSOR_CONFIG_FILE: &str = "preprocessor_config.json";

/// Default square input resolution of the segmentation model
pub const DEFAULT_TARGET_SIZE: u32 = 1024;

/// Image preprocessing parameters expected by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Model input size `[width, height]`
    pub target_size: [u32; 2],
    /// Per-channel mean applied after scaling to [0, 1]
    pub normalization_mean: [f32; 3],
    /// Per-channel standard deviation
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            target_size: [DEFAULT_TARGET_SIZE, DEFAULT_TARGET_SIZE],
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
        }
    }
}

impl PreprocessingConfig {
    /// Square configuration with the default ImageNet normalization
    #[must_use]
    pub fn square(size: u32) -> Self {
        Self {
            target_size: [size, size],
            ..Self::default()
        }
    }

    /// Validate sizes and normalization parameters
    pub fn validate(&self) -> Result<()> {
        if self.target_size[0] == 0 || self.target_size[0] != self.target_size[1] {
            return Err(BgRemovalError::invalid_config(format!(
                "Model input must be square and non-empty, got {}x{}",
                self.target_size[0], self.target_size[1]
            )));
        }
        if self.normalization_std.iter().any(|s| *s <= 0.0) {
            return Err(BgRemovalError::invalid_config(
                "Normalization std values must be positive",
            ));
        }
        Ok(())
    }
}

/// Subset of a HuggingFace `preprocessor_config.json`
#[derive(Debug, Deserialize)]
struct PreprocessorSidecar {
    size: Option<SidecarSize>,
    image_mean: Option<[f32; 3]>,
    image_std: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct SidecarSize {
    width: u32,
    height: u32,
}

/// Model information and metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub size_bytes: usize,
    pub input_shape: (usize, usize, usize, usize), // NCHW format
    pub output_shape: (usize, usize, usize, usize),
}

/// Location and preprocessing of an ONNX segmentation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Path to the `.onnx` file
    pub path: PathBuf,
    /// Preprocessing parameters
    pub preprocessing: PreprocessingConfig,
}

impl ModelSpec {
    /// Describe a model file, picking up a `preprocessor_config.json` that
    /// sits in the same directory
    pub fn from_path<P: AsRef<Path>>(path: P, target_size: Option<u32>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut preprocessing = PreprocessingConfig::default();

        let sidecar_path = path
            .parent()
            .map(|dir| dir.join(PREPROCESSOR_CONFIG_FILE));
        if let Some(sidecar_path) = sidecar_path.filter(|p| p.is_file()) {
            tracing::debug!(path = %sidecar_path.display(), "Reading preprocessing sidecar");
            let content = fs::read_to_string(&sidecar_path)?;
            let sidecar: PreprocessorSidecar = serde_json::from_str(&content).map_err(|e| {
                BgRemovalError::model_error_with_context(
                    "parse preprocessing config of",
                    &path,
                    &e.to_string(),
                    &[],
                )
            })?;
            if let Some(size) = sidecar.size {
                preprocessing.target_size = [size.width, size.height];
            }
            if let Some(mean) = sidecar.image_mean {
                preprocessing.normalization_mean = mean;
            }
            if let Some(std) = sidecar.image_std {
                preprocessing.normalization_std = std;
            }
        }

        if let Some(size) = target_size {
            preprocessing.target_size = [size, size];
        }
        preprocessing.validate()?;

        Ok(Self {
            path,
            preprocessing,
        })
    }

    /// Display name for tracing and logging
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }

    /// Read the model bytes from disk
    pub fn load_model(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            BgRemovalError::model_error_with_context(
                "read",
                &self.path,
                &e.to_string(),
                &["check the --model path", "verify file permissions"],
            )
        })
    }

    /// NCHW input shape
    #[must_use]
    pub fn input_shape(&self) -> (usize, usize, usize, usize) {
        let size = self.preprocessing.target_size[0] as usize;
        (1, 3, size, size)
    }

    /// NCHW output shape (single-channel mask)
    #[must_use]
    pub fn output_shape(&self) -> (usize, usize, usize, usize) {
        let size = self.preprocessing.target_size[0] as usize;
        (1, 1, size, size)
    }
}
