//! # lexi-rag
//!
//! The retrieval half of the Lexi document assistant: uploaded documents are
//! loaded into [`TextUnit`]s, embedded, and indexed as one [`DocumentSet`] per
//! upload batch; each question is then answered from a [`ContextPayload`]
//! holding the best-matching units and the last few dialogue turns.
//!
//! ## Overview
//!
//! - [`DocumentLoader`] - PDF and plain-text loading, split into size-bounded units
//! - [`EmbeddingProvider`] - the embedding contract, with the offline [`HashingEmbedder`]
//! - [`VectorIndex`] / [`IndexBuilder`] - nearest-neighbour search, with [`FlatIndex`]
//! - [`IndexManager`] - builds or reuses the document set per [`BatchFingerprint`]
//! - [`ContextAssembler`] - top-k retrieval plus the history window
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lexi_core::ConversationHistory;
//! use lexi_rag::{ContextAssembler, HashingEmbedder, IndexManager, RagConfig, UploadedDocument};
//!
//! let config = RagConfig::default();
//! let embedder = Arc::new(HashingEmbedder::default());
//! let mut manager = IndexManager::new(config.clone(), embedder.clone());
//! let report = manager.ensure_index(&[UploadedDocument::new("lease.pdf", bytes)]).await?;
//!
//! let assembler = ContextAssembler::new(embedder, &config);
//! let payload = assembler
//!     .assemble_default("When is rent due?", &ConversationHistory::new(), Some(&report.document_set))
//!     .await;
//! ```

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod hashing;
pub mod index;
pub mod loader;
pub mod manager;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{ContextAssembler, ContextPayload};
pub use document::{
    EmbeddedUnit, RetrievalResult, SearchResult, SkippedDocument, TextUnit, UploadedDocument,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use fingerprint::BatchFingerprint;
pub use hashing::HashingEmbedder;
pub use index::{FlatIndex, FlatIndexBuilder, IndexBuilder, VectorIndex};
pub use loader::{DocumentFormat, DocumentLoader};
pub use manager::{DocumentSet, IndexManager, IndexReport};
