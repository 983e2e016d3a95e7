//! HTTP error type
//!
//! Every failure leaves the service as `{"detail": "<message>"}` with the
//! status code of its kind.

use crate::{error::BgRemovalError, utils::ValidationError};
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload rejected before processing
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Required request field absent
    #[error("Field required: {0}")]
    MissingField(&'static str),

    /// Request body could not be parsed
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// Remote image could not be downloaded
    #[error("Failed to download image: {0}")]
    Fetch(String),

    /// Anything that went wrong after validation
    #[error("{0}")]
    Processing(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// Status code for this error kind
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(ValidationError::InvalidExtension { .. })
            | Self::BadRequest(_)
            | Self::Fetch(_) => StatusCode::BAD_REQUEST,
            Self::Validation(ValidationError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a multipart read failure; a body over the transport limit is
    /// reported like any other oversized upload
    #[must_use]
    pub fn from_multipart(error: &MultipartError, max_file_size: usize, body_limit: usize) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::Validation(ValidationError::TooLarge {
                size: body_limit,
                max: max_file_size,
            })
        } else {
            Self::BadRequest(error.body_text())
        }
    }
}

impl From<BgRemovalError> for ApiError {
    fn from(error: BgRemovalError) -> Self {
        match error {
            BgRemovalError::Network(msg) => Self::Fetch(msg),
            other => Self::Processing(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Processing(format!("Processing task failed: {error}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %detail, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), %detail, "Request rejected");
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}
