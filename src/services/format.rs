//! Output format handling service
//!
//! Decides when an image has to lose its alpha channel before encoding and
//! performs the alpha-to-white composite.

use crate::config::OutputFormat;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Check if a format supports transparency (alpha channel)
    ///
    /// # Examples
    /// ```rust
    /// use bgremove_server::{config::OutputFormat, services::OutputFormatHandler};
    ///
    /// assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
    /// assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    /// ```
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP | OutputFormat::Tiff => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// MIME type sent with encoded images
    #[must_use]
    pub fn mime_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    /// Whether `image` must be flattened before it can be written as `format`
    #[must_use]
    pub fn needs_flattening(image: &DynamicImage, format: OutputFormat) -> bool {
        !Self::supports_transparency(format) && image.color().has_alpha()
    }

    /// Composite `image` onto an opaque white canvas of the same size
    ///
    /// Each channel becomes `(c * a + 255 * (255 - a)) / 255`, rounded.
    /// Images without alpha come back unchanged apart from RGB conversion.
    #[must_use]
    pub fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
        DynamicImage::ImageRgb8(Self::flatten_rgba(&image.to_rgba8()))
    }

    fn flatten_rgba(rgba: &RgbaImage) -> RgbImage {
        let mut flattened = RgbImage::new(rgba.width(), rgba.height());
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = u32::from(pixel[3]);
            let blend = |c: u8| -> u8 {
                let value = (u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255;
                value.min(255) as u8
            };
            flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }
        flattened
    }

    /// Convert a remover result into something the `format` encoder accepts
    #[must_use]
    pub fn prepare_for_encoding(image: RgbaImage, format: OutputFormat) -> DynamicImage {
        if Self::supports_transparency(format) {
            DynamicImage::ImageRgba8(image)
        } else {
            DynamicImage::ImageRgb8(Self::flatten_rgba(&image))
        }
    }
}
