//! Error types for the emitters.

use datagen_core::GenError;
use thiserror::Error;

/// Errors that can occur while writing generated entities.
#[derive(Error, Debug)]
pub enum EmitError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A nested entity could not be attached to its parent.
    #[error("Cannot attach nested entity under `{key}`: {reason}")]
    Nested { key: String, reason: String },

    /// Output was written to after being finalized.
    #[error("Emitter already finalized")]
    Finalized,
}

impl From<EmitError> for GenError {
    fn from(err: EmitError) -> Self {
        GenError::emit(err)
    }
}
