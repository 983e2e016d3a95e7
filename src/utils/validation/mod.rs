//! Input validation
//!
//! Checks applied to client uploads before any image work starts.

pub mod upload;

pub use upload::{UploadValidator, ValidationError};
