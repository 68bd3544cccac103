//! Error types for the `lexi-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing or retrieving documents.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RagError {
    /// The document bytes could not be parsed as the expected format.
    #[error("Unreadable document '{source_id}': {reason}")]
    UnreadableDocument {
        /// The document that failed to load.
        source_id: String,
        /// A description of the failure.
        reason: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality the index was built with.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality configured for the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The vector index failed to answer a search.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Shorthand for a [`RagError::UnreadableDocument`].
    pub fn unreadable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::UnreadableDocument { source_id: source_id.into(), reason: reason.to_string() }
    }

    /// Shorthand for a [`RagError::Embedding`].
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Embedding { provider: provider.into(), message: message.into() }
    }

    /// Whether retrying the whole index build may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Embedding { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
