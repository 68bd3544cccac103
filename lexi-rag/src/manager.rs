//! Document set lifecycle: build an index per upload batch, reuse it while
//! the batch stays the same.
//!
//! # Example
//!
//! ```rust,ignore
//! use lexi_rag::{HashingEmbedder, IndexManager, RagConfig, UploadedDocument};
//!
//! let mut manager = IndexManager::new(RagConfig::default(), Arc::new(HashingEmbedder::default()));
//! let report = manager.ensure_index(&[UploadedDocument::new("lease.pdf", bytes)]).await?;
//! for skipped in &report.skipped {
//!     eprintln!("skipped {}: {}", skipped.source_id, skipped.reason);
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RagConfig;
use crate::document::{EmbeddedUnit, SkippedDocument, TextUnit, UploadedDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::fingerprint::BatchFingerprint;
use crate::index::{FlatIndexBuilder, IndexBuilder, VectorIndex};
use crate::loader::DocumentLoader;

/// The indexed representation of one upload batch.
///
/// `index` holds embeddings for exactly `units`. A document set is never
/// modified after it is built.
pub struct DocumentSet {
    id: String,
    fingerprint: BatchFingerprint,
    units: Vec<TextUnit>,
    sources: Vec<String>,
    skipped: Vec<SkippedDocument>,
    embedder: String,
    index: Arc<dyn VectorIndex>,
}

impl std::fmt::Debug for DocumentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSet")
            .field("id", &self.id)
            .field("fingerprint", &self.fingerprint.short())
            .field("units", &self.units.len())
            .field("sources", &self.sources)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl DocumentSet {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fingerprint(&self) -> &BatchFingerprint {
        &self.fingerprint
    }

    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    /// Sources that contributed to the set, in upload order.
    pub fn source_names(&self) -> &[String] {
        &self.sources
    }

    /// Documents of the batch that could not be loaded.
    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    /// Name of the embedding model the index was built with.
    pub fn embedder(&self) -> &str {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Outcome of [`IndexManager::ensure_index`].
#[derive(Debug, Clone)]
pub struct IndexReport {
    /// The document set now held by the manager.
    pub document_set: Arc<DocumentSet>,
    /// `false` when the batch matched the held set and nothing was embedded.
    pub rebuilt: bool,
    /// Documents skipped because they could not be loaded.
    pub skipped: Vec<SkippedDocument>,
}

/// Owns the current [`DocumentSet`] and decides when to rebuild it.
pub struct IndexManager {
    config: RagConfig,
    loader: DocumentLoader,
    embedder: Arc<dyn EmbeddingProvider>,
    builder: Arc<dyn IndexBuilder>,
    current: Option<Arc<DocumentSet>>,
}

impl IndexManager {
    /// A manager that builds [`FlatIndex`](crate::index::FlatIndex)es.
    pub fn new(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            loader: DocumentLoader::from_config(&config),
            config,
            embedder,
            builder: Arc::new(FlatIndexBuilder),
            current: None,
        }
    }

    /// Use a different index implementation.
    pub fn with_index_builder(mut self, builder: Arc<dyn IndexBuilder>) -> Self {
        self.builder = builder;
        self
    }

    /// Use a different loader.
    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The document set currently held, if any.
    pub fn current(&self) -> Option<Arc<DocumentSet>> {
        self.current.clone()
    }

    /// Drop the held document set.
    pub fn clear(&mut self) {
        if let Some(set) = self.current.take() {
            info!(document_set = %set.id, "document set dropped");
        }
    }

    /// Make sure the held document set matches `batch`.
    ///
    /// If the batch fingerprint equals the held set's, the set is returned
    /// as is and nothing is embedded. Otherwise every document is loaded
    /// (unreadable ones are skipped and reported), every unit is embedded and
    /// a new index is built; only then does the new set replace the old one.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] once all build attempts failed, or
    /// [`RagError::DimensionMismatch`] if the embedder returned vectors of the
    /// wrong size. In both cases the previously held set stays in place.
    pub async fn ensure_index(&mut self, batch: &[UploadedDocument]) -> Result<IndexReport> {
        let fingerprint = BatchFingerprint::of(batch);

        if let Some(current) = &self.current {
            if current.fingerprint == fingerprint {
                info!(document_set = %current.id, fingerprint = fingerprint.short(), "document set reused");
                return Ok(IndexReport {
                    document_set: Arc::clone(current),
                    rebuilt: false,
                    skipped: current.skipped.clone(),
                });
            }
        }

        let (units, sources, skipped) = self.load_batch(batch);
        let index = self.build_with_retry(&units).await?;

        let set = Arc::new(DocumentSet {
            id: Uuid::new_v4().to_string(),
            fingerprint,
            units,
            sources,
            skipped: skipped.clone(),
            embedder: self.embedder.name().to_string(),
            index,
        });
        info!(
            document_set = %set.id,
            fingerprint = set.fingerprint.short(),
            documents = set.sources.len(),
            units = set.units.len(),
            skipped = skipped.len(),
            "document set built"
        );

        self.current = Some(Arc::clone(&set));
        Ok(IndexReport { document_set: set, rebuilt: true, skipped })
    }

    fn load_batch(
        &self,
        batch: &[UploadedDocument],
    ) -> (Vec<TextUnit>, Vec<String>, Vec<SkippedDocument>) {
        let mut units = Vec::new();
        let mut sources = Vec::new();
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();

        for document in batch {
            if !seen.insert(document.source_id.as_str()) {
                warn!(source_id = %document.source_id, "duplicate source id skipped");
                skipped.push(SkippedDocument {
                    source_id: document.source_id.clone(),
                    reason: "duplicate source id in batch".to_string(),
                });
                continue;
            }

            match self.loader.load(&document.bytes, &document.source_id) {
                Ok(loaded) => {
                    sources.push(document.source_id.clone());
                    units.extend(loaded);
                }
                Err(e) => {
                    warn!(source_id = %document.source_id, error = %e, "document skipped");
                    let reason = match e {
                        RagError::UnreadableDocument { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    skipped.push(SkippedDocument { source_id: document.source_id.clone(), reason });
                }
            }
        }

        (units, sources, skipped)
    }

    async fn build_with_retry(&self, units: &[TextUnit]) -> Result<Arc<dyn VectorIndex>> {
        let max_attempts = self.config.embed_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.embed_and_build(units).await {
                Ok(index) => return Ok(index),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(attempt, max_attempts, error = %e, ?delay, "index build failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempt, error = %e, "index build failed");
                    return Err(e);
                }
            }
        }
    }

    async fn embed_and_build(&self, units: &[TextUnit]) -> Result<Arc<dyn VectorIndex>> {
        let dimensions = self.embedder.dimensions();
        let texts: Vec<&str> = units.iter().map(|u| u.content.as_str()).collect();
        let vectors = if texts.is_empty() { Vec::new() } else { self.embedder.embed_batch(&texts).await? };

        if vectors.len() != units.len() {
            return Err(RagError::embedding(
                self.embedder.name(),
                format!("expected {} embeddings, got {}", units.len(), vectors.len()),
            ));
        }

        let embedded: Vec<EmbeddedUnit> = units
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(unit, vector)| EmbeddedUnit { unit, vector })
            .collect();
        self.builder.build(dimensions, embedded).await
    }
}
