//! Error types for the progress engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A persistence gateway call failed. Carries the underlying cause;
    /// the engine surfaces it without retrying.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn storage(cause: impl std::fmt::Display) -> Self {
        EngineError::Storage(cause.to_string())
    }
}
