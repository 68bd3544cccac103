use lexi_core::CoreError;
use lexi_rag::RagError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyInput,

    #[error("document error: {0}")]
    Rag(#[from] RagError),

    #[error("generation failed: {0}")]
    Generation(#[from] CoreError),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
