//! Background remover abstraction
//!
//! The HTTP layer only sees this trait. The shipped implementation is
//! [`BackgroundRemovalProcessor`](crate::processor::BackgroundRemovalProcessor);
//! tests substitute deterministic removers.

use crate::error::Result;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;

/// Turns an image into the same-size image with its background made transparent
///
/// Implementations are shared across concurrent requests and must tolerate
/// parallel calls.
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from `image`
    ///
    /// # Errors
    /// - Model inference failures
    /// - Mask generation failures
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage>;

    /// Short name used in logs
    fn name(&self) -> String {
        "background-remover".to_string()
    }
}

impl<T: BackgroundRemover + ?Sized> BackgroundRemover for Arc<T> {
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        (**self).remove(image)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<T: BackgroundRemover + ?Sized> BackgroundRemover for Box<T> {
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        (**self).remove(image)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}
