//! In-memory image decoding and encoding

use crate::{
    config::OutputFormat,
    error::{BgRemovalError, Result},
};
use image::DynamicImage;
use std::io::Cursor;

/// Service for image codec operations on byte buffers
pub struct ImageIOService;

impl ImageIOService {
    /// Decode an image, detecting the format from its content
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgremove_server::services::ImageIOService;
    ///
    /// let image_data = std::fs::read("input.jpg")?;
    /// let image = ImageIOService::decode(&image_data)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            BgRemovalError::processing_stage_error("decode", &e.to_string(), None)
        })
    }

    /// Encode `image` as `format`
    ///
    /// The image must already be in a colour type the encoder accepts; see
    /// [`OutputFormatHandler::prepare_for_encoding`](crate::services::OutputFormatHandler::prepare_for_encoding).
    pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, format.image_format())
            .map_err(|e| {
                BgRemovalError::processing_stage_error(
                    "encode",
                    &e.to_string(),
                    Some(&format!(
                        "format: {format}, {}x{}",
                        image.width(),
                        image.height()
                    )),
                )
            })?;
        Ok(buffer.into_inner())
    }
}
