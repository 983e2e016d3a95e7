//! Upload precondition checks
//!
//! These run before any decoding so that rejected uploads never reach the
//! image codec or the model.

use crate::config::UploadPolicy;
use thiserror::Error;

/// Upload rejected by a precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Filename has no dot or its extension is not in the allow-list
    #[error("Invalid file type. Allowed: {allowed}")]
    InvalidExtension {
        filename: String,
        allowed: String,
    },

    /// Payload exceeds the configured maximum size
    #[error("File too large. Maximum size is {}", format_limit(.max))]
    TooLarge { size: usize, max: usize },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn format_limit(bytes: &usize) -> String {
    const MIB: usize = 1024 * 1024;
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Validator for uploaded images
#[derive(Debug, Clone)]
pub struct UploadValidator<'a> {
    policy: &'a UploadPolicy,
}

impl<'a> UploadValidator<'a> {
    #[must_use]
    pub fn new(policy: &'a UploadPolicy) -> Self {
        Self { policy }
    }

    /// Accept iff the filename has a dot and the text after the last dot,
    /// lowercased, is an allowed extension
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        let accepted = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .is_some_and(|ext| self.policy.allowed_extensions.iter().any(|a| *a == ext));

        if accepted {
            Ok(())
        } else {
            Err(ValidationError::InvalidExtension {
                filename: filename.to_string(),
                allowed: self.policy.allowed_extensions.join(", "),
            })
        }
    }

    /// Accept iff `size` does not exceed the maximum
    pub fn validate_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.policy.max_file_size {
            Err(ValidationError::TooLarge {
                size,
                max: self.policy.max_file_size,
            })
        } else {
            Ok(())
        }
    }
}
