//! Error types for the `lexi-core` crate.

use thiserror::Error;

/// Errors raised by a generative model.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    /// The model rejected the request or failed while streaming.
    #[error("Generation error ({model}): {message}")]
    Generation {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The request itself was malformed before reaching the model.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Generation`].
    pub fn generation(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation { model: model.into(), message: message.into() }
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, CoreError>;
