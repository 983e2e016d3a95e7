//! Response bodies

use crate::pipeline::ProcessedImage;
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed body of the health probe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "Background Remover API".to_string(),
        }
    }
}

/// JSON envelope carrying a base64-encoded result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalEnvelope {
    pub success: bool,
    /// Standard base64 of the encoded image
    pub image: String,
    /// Format label as the client asked for it
    pub format: String,
    /// `[width, height]` of the decoded input
    pub original_size: [u32; 2],
    /// RFC 3339 creation time
    pub timestamp: String,
}

impl RemovalEnvelope {
    #[must_use]
    pub fn new(processed: &ProcessedImage, format_label: impl Into<String>) -> Self {
        let (width, height) = processed.original_size;
        Self {
            success: true,
            image: STANDARD.encode(&processed.bytes),
            format: format_label.into(),
            original_size: [width, height],
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// `removed_bg_<8 hex chars>.<extension>`
#[must_use]
pub fn attachment_filename(extension: &str) -> String {
    let token: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("removed_bg_{token}.{}", extension.trim().to_lowercase())
}

/// Binary download response for `processed`
///
/// `requested_format` is the client's format tag and becomes the file
/// extension.
#[must_use]
pub fn attachment(processed: ProcessedImage, requested_format: &str) -> Response {
    let disposition = format!(
        "attachment; filename={}",
        attachment_filename(requested_format)
    );
    (
        [
            (header::CONTENT_TYPE, processed.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        processed.bytes,
    )
        .into_response()
}
