//! HTTP interface
//!
//! Routes:
//! - `GET /` demo page (optional)
//! - `GET /health`
//! - `POST /remove-bg` multipart upload
//! - `POST /remove-bg-url` remote image by URL

pub mod demo;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod startup;

pub use envelope::{HealthResponse, RemovalEnvelope};
pub use error::ApiError;
pub use startup::{build_router, AppState, Application};
