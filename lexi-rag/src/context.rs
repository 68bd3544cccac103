//! Context assembly: retrieved passages plus a bounded history window.

use std::collections::BTreeSet;
use std::sync::Arc;

use lexi_core::{ConversationHistory, ConversationTurn};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::document::{SearchResult, TextUnit};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::manager::DocumentSet;

/// Everything the prompt builder needs for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Retrieved units with their scores, best first.
    pub retrieved: Vec<SearchResult>,
    /// Distinct sources of the retrieved units.
    ///
    /// Only documents that contributed a passage to this turn are listed,
    /// not every document in the set; see [`DocumentSet::source_names`] for
    /// the full upload.
    pub source_names: BTreeSet<String>,
    /// The most recent dialogue turns, oldest first.
    pub recent_turns: Vec<ConversationTurn>,
    /// Why retrieval was skipped for this turn, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<String>,
}

impl ContextPayload {
    /// Retrieved units in rank order.
    pub fn retrieved_units(&self) -> impl Iterator<Item = &TextUnit> {
        self.retrieved.iter().map(|r| &r.unit)
    }

    /// Whether any document text was retrieved.
    pub fn has_context(&self) -> bool {
        !self.retrieved.is_empty()
    }
}

/// Builds [`ContextPayload`]s.
///
/// Reads the document set and history without modifying either. Retrieval
/// problems never fail assembly: the payload then carries no passages and
/// records the reason in [`ContextPayload::retrieval_error`].
pub struct ContextAssembler {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    history_window: usize,
    similarity_threshold: Option<f32>,
}

impl ContextAssembler {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self {
            embedder,
            top_k: config.top_k,
            history_window: config.history_window,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Number of units retrieved by [`assemble_default`](Self::assemble_default).
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Assemble with the configured `top_k`.
    pub async fn assemble_default(
        &self,
        query: &str,
        history: &ConversationHistory,
        document_set: Option<&DocumentSet>,
    ) -> ContextPayload {
        self.assemble(query, history, document_set, self.top_k).await
    }

    /// Assemble the context for `query`.
    ///
    /// Without a document set retrieval is skipped and only the history
    /// window is filled.
    pub async fn assemble(
        &self,
        query: &str,
        history: &ConversationHistory,
        document_set: Option<&DocumentSet>,
        k: usize,
    ) -> ContextPayload {
        let recent_turns = history.recent_dialogue(self.history_window);

        let Some(set) = document_set else {
            debug!("no documents uploaded, assembling without retrieval");
            return ContextPayload { recent_turns, ..ContextPayload::default() };
        };

        match self.retrieve(query, set, k).await {
            Ok(retrieved) => {
                let source_names = retrieved.iter().map(|r| r.unit.source_id.clone()).collect();
                debug!(document_set = set.id(), retrieved = retrieved.len(), "context assembled");
                ContextPayload { retrieved, source_names, recent_turns, retrieval_error: None }
            }
            Err(e) => {
                warn!(document_set = set.id(), error = %e, "retrieval failed, answering without context");
                ContextPayload { recent_turns, retrieval_error: Some(e.to_string()), ..ContextPayload::default() }
            }
        }
    }

    async fn retrieve(&self, query: &str, set: &DocumentSet, k: usize) -> Result<Vec<SearchResult>> {
        if set.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if set.embedder() != self.embedder.name() {
            return Err(RagError::Retrieval(format!(
                "index built with '{}' cannot be queried with '{}'",
                set.embedder(),
                self.embedder.name()
            )));
        }

        let query_vector = self.embedder.embed(query).await?;
        let mut results = set.index().search(&query_vector, k).await?;
        if let Some(threshold) = self.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }
        Ok(results)
    }
}
