//! Image preprocessing for segmentation models
//!
//! Letterboxes the input into the model's square canvas and normalizes it into
//! an NCHW tensor. `LetterboxTransform` records the resize and centring so the
//! processor can map the model output back onto the original pixel grid.

use crate::{
    error::{BgRemovalError, Result},
    models::PreprocessingConfig,
};
use image::{DynamicImage, ImageBuffer, RgbImage};
use ndarray::Array4;

/// Configuration for preprocessing behavior
#[derive(Debug, Clone)]
pub struct PreprocessingOptions {
    /// Padding color for aspect ratio preservation (RGB)
    pub padding_color: [u8; 3],
}

impl Default for PreprocessingOptions {
    fn default() -> Self {
        Self {
            padding_color: [255, 255, 255], // White padding
        }
    }
}

/// Resize and centring applied when letterboxing an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    /// Scale factor from original to canvas coordinates
    pub scale: f32,
    /// X offset of the resized image inside the canvas
    pub offset_x: u32,
    /// Y offset of the resized image inside the canvas
    pub offset_y: u32,
    /// Side length of the square canvas
    pub target_size: u32,
}

impl LetterboxTransform {
    /// Compute the transform for an image of `width` x `height`
    pub fn new(width: u32, height: u32, target_size: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BgRemovalError::processing_stage_error(
                "preprocessing",
                "image has no pixels",
                Some(&format!("{width}x{height}")),
            ));
        }

        let target_size_f32 = target_size as f32;
        let scale = (target_size_f32 / width as f32).min(target_size_f32 / height as f32);
        let (new_width, new_height) = Self::scaled_dimensions(width, height, scale, target_size);

        Ok(Self {
            scale,
            offset_x: (target_size - new_width) / 2,
            offset_y: (target_size - new_height) / 2,
            target_size,
        })
    }

    fn scaled_dimensions(width: u32, height: u32, scale: f32, target_size: u32) -> (u32, u32) {
        let new_width = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let new_height = ((height as f32 * scale).round() as u32).clamp(1, target_size);
        (new_width, new_height)
    }

    /// Canvas coordinate for an original pixel, `None` outside the canvas
    #[must_use]
    pub fn to_canvas(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        let canvas_x = (x as f32 * self.scale).round() as u32 + self.offset_x;
        let canvas_y = (y as f32 * self.scale).round() as u32 + self.offset_y;
        (canvas_x < self.target_size && canvas_y < self.target_size).then_some((canvas_x, canvas_y))
    }
}

/// Shared image preprocessing utilities
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Preprocess image for model inference
    ///
    /// - RGB conversion
    /// - Aspect ratio preserving resize
    /// - Center padding to target size
    /// - Normalization to tensor format (NCHW)
    pub fn preprocess_image(
        image: &DynamicImage,
        preprocessing_config: &PreprocessingConfig,
        options: &PreprocessingOptions,
    ) -> Result<(LetterboxTransform, Array4<f32>)> {
        let target_size = preprocessing_config.target_size[0];
        let rgb_image = image.to_rgb8();
        let (orig_width, orig_height) = rgb_image.dimensions();

        let transform = LetterboxTransform::new(orig_width, orig_height, target_size)?;
        let (new_width, new_height) = LetterboxTransform::scaled_dimensions(
            orig_width,
            orig_height,
            transform.scale,
            target_size,
        );

        let resized = image::imageops::resize(
            &rgb_image,
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );

        let padding = options.padding_color;
        let mut canvas = ImageBuffer::from_pixel(
            target_size,
            target_size,
            image::Rgb([padding[0], padding[1], padding[2]]),
        );
        image::imageops::replace(
            &mut canvas,
            &resized,
            i64::from(transform.offset_x),
            i64::from(transform.offset_y),
        );

        let target_size_usize = target_size.try_into().map_err(|_| {
            BgRemovalError::processing(
                "Target size too large for usize conversion in tensor allocation",
            )
        })?;

        let tensor = Self::canvas_to_tensor(&canvas, preprocessing_config, target_size_usize);
        Ok((transform, tensor))
    }

    /// Convert canvas to normalized tensor
    #[allow(clippy::indexing_slicing)]
    // Safe: channel < 3 for both the pixel and the normalization arrays
    fn canvas_to_tensor(
        canvas: &RgbImage,
        preprocessing_config: &PreprocessingConfig,
        target_size: usize,
    ) -> Array4<f32> {
        let mean = preprocessing_config.normalization_mean;
        let std = preprocessing_config.normalization_std;
        let mut tensor = Array4::<f32>::zeros((1, 3, target_size, target_size));

        for (x, y, pixel) in canvas.enumerate_pixels() {
            for channel in 0..3 {
                let normalized =
                    (f32::from(pixel[channel]) / 255.0 - mean[channel]) / std[channel];
                if let Some(elem) = tensor.get_mut([0, channel, y as usize, x as usize]) {
                    *elem = normalized;
                }
            }
        }

        tensor
    }

    /// Preprocess with the default white padding
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        preprocessing_config: &PreprocessingConfig,
    ) -> Result<(LetterboxTransform, Array4<f32>)> {
        Self::preprocess_image(
            image,
            preprocessing_config,
            &PreprocessingOptions::default(),
        )
    }
}
