//! Backend implementations for different inference engines
//!
//! - Tract backend (pure Rust ONNX inference)
//! - Mock backend (deterministic colour-key mask, no model file)

pub mod mock;

#[cfg(feature = "tract")]
pub mod tract;

pub use self::mock::MockBackend;

#[cfg(feature = "tract")]
pub use self::tract::TractBackend;
