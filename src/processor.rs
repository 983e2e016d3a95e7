//! Background removal processor
//!
//! `BackgroundRemovalProcessor` owns one initialized inference backend and
//! turns decoded images into cut-outs: letterbox preprocessing, inference,
//! mapping the output tensor back onto the original pixel grid, and applying
//! the mask as alpha.

use crate::{
    error::{BgRemovalError, Result},
    inference::InferenceBackend,
    models::{ModelSpec, PreprocessingConfig},
    remover::BackgroundRemover,
    types::SegmentationMask,
    utils::{ImagePreprocessor, LetterboxTransform},
};
use image::{DynamicImage, RgbaImage};
use instant::Instant;
use ndarray::Array4;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Backend type enumeration for runtime selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendType {
    /// Tract backend (pure Rust ONNX inference)
    Tract,
    /// Colour-key backend, needs no model file
    Mock,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tract => write!(f, "tract"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for BackendType {
    type Err = BgRemovalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tract" => Ok(Self::Tract),
            "mock" => Ok(Self::Mock),
            other => Err(BgRemovalError::invalid_config(format!(
                "Unknown backend '{other}' (expected tract or mock)"
            ))),
        }
    }
}

/// Factory trait for creating inference backends
pub trait BackendFactory: Send + Sync {
    /// Create an uninitialized backend of the specified type
    ///
    /// # Errors
    /// - Backend type not compiled into this build
    fn create_backend(&self, backend_type: BackendType) -> Result<Box<dyn InferenceBackend>>;
}

/// Backend factory for the backends compiled into this crate
#[derive(Debug, Default)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(&self, backend_type: BackendType) -> Result<Box<dyn InferenceBackend>> {
        match backend_type {
            #[cfg(feature = "tract")]
            BackendType::Tract => Ok(Box::new(crate::backends::TractBackend::new())),
            #[cfg(not(feature = "tract"))]
            BackendType::Tract => Err(BgRemovalError::invalid_config(
                "Tract backend not available. Rebuild with the 'tract' feature.",
            )),
            BackendType::Mock => Ok(Box::new(crate::backends::MockBackend::new())),
        }
    }
}

/// Background remover backed by a segmentation model
pub struct BackgroundRemovalProcessor {
    backend: Box<dyn InferenceBackend>,
    preprocessing: PreprocessingConfig,
    model_name: String,
}

impl fmt::Debug for BackgroundRemovalProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundRemovalProcessor")
            .field("model", &self.model_name)
            .field("preprocessing", &self.preprocessing)
            .finish_non_exhaustive()
    }
}

impl BackgroundRemovalProcessor {
    /// Create and initialize a processor with the default backend factory
    ///
    /// # Errors
    ///
    /// Returns `BgRemovalError` for:
    /// - Backend type not compiled in
    /// - Model loading failures
    pub fn new(backend_type: BackendType, spec: &ModelSpec) -> Result<Self> {
        Self::with_factory(&DefaultBackendFactory, backend_type, spec)
    }

    /// Create and initialize a processor with a custom backend factory
    ///
    /// # Errors
    ///
    /// Returns `BgRemovalError` for:
    /// - Backend factory failures
    /// - Model loading failures
    pub fn with_factory(
        factory: &dyn BackendFactory,
        backend_type: BackendType,
        spec: &ModelSpec,
    ) -> Result<Self> {
        let backend = factory.create_backend(backend_type)?;
        Self::with_backend(backend, spec)
    }

    /// Initialize `backend` with `spec` and wrap it
    ///
    /// # Errors
    ///
    /// Returns `BgRemovalError` for model loading failures or an invalid
    /// preprocessing configuration.
    pub fn with_backend(mut backend: Box<dyn InferenceBackend>, spec: &ModelSpec) -> Result<Self> {
        info!(model = %spec.display_name(), "Initializing background removal processor");
        if let Some(load_time) = backend.initialize(spec)? {
            debug!(elapsed_ms = load_time.as_millis() as u64, "Model loaded");
        }
        Self::from_initialized(backend)
    }

    /// Wrap a backend that is already initialized
    ///
    /// # Errors
    ///
    /// Returns `BgRemovalError` if the backend is not initialized or reports
    /// an invalid preprocessing configuration.
    pub fn from_initialized(backend: Box<dyn InferenceBackend>) -> Result<Self> {
        if !backend.is_initialized() {
            return Err(BgRemovalError::internal("Backend not initialized"));
        }

        let preprocessing = backend.preprocessing_config()?;
        preprocessing.validate()?;
        let info = backend.model_info()?;

        info!(
            model = %info.name,
            size_bytes = info.size_bytes,
            input = ?info.input_shape,
            output = ?info.output_shape,
            "Background removal processor ready"
        );
        let model_name = info.name;

        Ok(Self {
            backend,
            preprocessing,
            model_name,
        })
    }

    /// Preprocessing parameters in use
    #[must_use]
    pub fn preprocessing_config(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }

    /// Compute the foreground mask for `image` on its own pixel grid
    #[instrument(
        skip(self, image),
        fields(model = %self.model_name, dimensions = %format!("{}x{}", image.width(), image.height()))
    )]
    pub fn segment(&self, image: &DynamicImage) -> Result<SegmentationMask> {
        let preprocess_start = Instant::now();
        let (transform, input_tensor) =
            ImagePreprocessor::preprocess_for_inference(image, &self.preprocessing)?;
        let preprocessing_ms = preprocess_start.elapsed().as_millis() as u64;

        let inference_start = Instant::now();
        let output_tensor = self.backend.infer(&input_tensor)?;
        let inference_ms = inference_start.elapsed().as_millis() as u64;

        let mask =
            Self::tensor_to_mask(&output_tensor, &transform, (image.width(), image.height()))?;

        debug!(
            preprocessing_ms,
            inference_ms,
            foreground_ratio = mask.foreground_ratio(),
            "Segmentation completed"
        );

        Ok(mask)
    }

    /// Convert output tensor to a mask on the original pixel grid
    fn tensor_to_mask(
        tensor: &Array4<f32>,
        transform: &LetterboxTransform,
        original_dimensions: (u32, u32),
    ) -> Result<SegmentationMask> {
        let (batch, channels, mask_height, mask_width) = tensor.dim();
        if batch != 1 || channels != 1 {
            return Err(BgRemovalError::processing(format!(
                "Invalid output tensor shape {:?}, expected (1, 1, H, W)",
                tensor.shape()
            )));
        }

        // Models may emit a mask at a different resolution than their input
        let transform = if mask_width == transform.target_size as usize {
            *transform
        } else {
            let side = u32::try_from(mask_width)
                .map_err(|_| BgRemovalError::processing("Output tensor too large"))?;
            LetterboxTransform::new(original_dimensions.0, original_dimensions.1, side)?
        };

        let (orig_width, orig_height) = original_dimensions;
        let mut mask_data = Vec::with_capacity(orig_width as usize * orig_height as usize);

        for y in 0..orig_height {
            for x in 0..orig_width {
                let value = transform
                    .to_canvas(x, y)
                    .filter(|&(_, cy)| (cy as usize) < mask_height)
                    .and_then(|(cx, cy)| tensor.get([0, 0, cy as usize, cx as usize]).copied())
                    .unwrap_or(0.0);
                mask_data.push((value.clamp(0.0, 1.0) * 255.0) as u8);
            }
        }

        Ok(SegmentationMask::new(mask_data, original_dimensions))
    }
}

impl BackgroundRemover for BackgroundRemovalProcessor {
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let mask = self.segment(image)?;
        mask.apply_to_image(&image.to_rgba8())
    }

    fn name(&self) -> String {
        self.model_name.clone()
    }
}
