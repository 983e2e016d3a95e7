//! Shared utilities for preprocessing and request validation

pub mod preprocessing;
pub mod validation;

pub use preprocessing::{ImagePreprocessor, LetterboxTransform, PreprocessingOptions};
pub use validation::{UploadValidator, ValidationError};
