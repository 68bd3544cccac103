//! Data types for uploaded documents, text units and search results.

use serde::{Deserialize, Serialize};

/// Raw bytes of one uploaded document, as received at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// Stable identifier, usually the uploaded filename.
    pub source_id: String,
    /// The document contents.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Create a new uploaded document.
    pub fn new(source_id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { source_id: source_id.into(), bytes: bytes.into() }
    }
}

/// An atomic retrievable piece of document text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// The text content of the unit.
    pub content: String,
    /// The document this unit came from.
    pub source_id: String,
    /// 1-based, strictly increasing order of the unit within its source.
    pub position: usize,
    /// 1-based page the unit was extracted from.
    pub page: usize,
}

impl TextUnit {
    /// Create a unit that covers a whole page (`page == position`).
    pub fn new(content: impl Into<String>, source_id: impl Into<String>, position: usize) -> Self {
        Self { content: content.into(), source_id: source_id.into(), position, page: position }
    }

    /// Set the page the unit was extracted from.
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// A [`TextUnit`] paired with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedUnit {
    /// The embedded unit.
    pub unit: TextUnit,
    /// The vector embedding for the unit's content.
    pub vector: Vec<f32>,
}

/// A retrieved [`TextUnit`] paired with a relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved unit.
    pub unit: TextUnit,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Search results ordered by descending score.
pub type RetrievalResult = Vec<SearchResult>;

/// A document dropped from an upload batch because it could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    /// The document that was skipped.
    pub source_id: String,
    /// Why it was skipped.
    pub reason: String,
}
