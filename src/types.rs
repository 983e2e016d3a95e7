//! Core types for background removal operations

use crate::error::{BgRemovalError, Result};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Per-pixel foreground mask on the original image grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Cut the foreground out of `image`
    ///
    /// Output alpha is the mask value scaled by the source alpha, so pixels
    /// that were transparent in the input stay transparent. A zero result
    /// becomes fully transparent black.
    pub fn apply_to_image(&self, image: &RgbaImage) -> Result<RgbaImage> {
        if image.dimensions() != self.dimensions {
            let (img_width, img_height) = image.dimensions();
            let (mask_width, mask_height) = self.dimensions;
            return Err(BgRemovalError::processing(format!(
                "Image and mask dimensions do not match: {img_width}x{img_height} vs {mask_width}x{mask_height}"
            )));
        }

        let width = self.dimensions.0;
        let mut result = RgbaImage::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            let index = (y as usize) * (width as usize) + x as usize;
            let mask = self.data.get(index).copied().unwrap_or(0);
            let alpha = combine_alpha(mask, pixel[3]);
            let out = if alpha > 0 {
                Rgba([pixel[0], pixel[1], pixel[2], alpha])
            } else {
                Rgba([0, 0, 0, 0])
            };
            result.put_pixel(x, y, out);
        }

        Ok(result)
    }

    /// Share of pixels classified as foreground (mask value above 127)
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&x| x > 127).count();
        foreground as f32 / self.data.len() as f32
    }
}

/// Rounded product of two 8-bit alphas
fn combine_alpha(mask: u8, source: u8) -> u8 {
    ((u16::from(mask) * u16::from(source) + 127) / 255) as u8
}
