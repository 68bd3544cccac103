//! Vector index traits and the flat in-memory implementation.
//!
//! An index is built once from a complete set of [`EmbeddedUnit`]s and is
//! immutable afterwards; a changed upload batch gets a brand new index.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{EmbeddedUnit, SearchResult};
use crate::error::{RagError, Result};

/// A built, read-only nearest-neighbour index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Dimensionality every stored and query vector must have.
    fn dimensions(&self) -> usize;

    /// Number of stored units.
    fn len(&self) -> usize;

    /// Whether the index holds no units.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search for the `k` units most similar to `query`.
    ///
    /// Returns results ordered by descending similarity score. Repeated
    /// identical queries return identical orderings.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;
}

/// Builds a [`VectorIndex`] from embedded units.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Build an index over exactly `units`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if any vector does not have
    /// `dimensions` entries.
    async fn build(
        &self,
        dimensions: usize,
        units: Vec<EmbeddedUnit>,
    ) -> Result<Arc<dyn VectorIndex>>;
}

/// An exhaustive cosine-similarity index kept in memory.
///
/// Units are scanned in insertion order and the sort is stable, so equal
/// scores come back in the order the units were inserted.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    units: Vec<EmbeddedUnit>,
}

impl FlatIndex {
    /// Build the index, validating every vector's dimensionality.
    pub fn new(dimensions: usize, units: Vec<EmbeddedUnit>) -> Result<Self> {
        if let Some(bad) = units.iter().find(|u| u.vector.len() != dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                actual: bad.vector.len(),
            });
        }
        Ok(Self { dimensions, units })
    }

    /// Stored units in insertion order.
    pub fn units(&self) -> &[EmbeddedUnit] {
        &self.units
    }

    /// Synchronous search used by the [`VectorIndex`] implementation.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Retrieval`] if a similarity score is NaN, which
    /// happens when a stored or query vector contains NaN.
    pub fn search_sync(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<SearchResult> = self
            .units
            .iter()
            .map(|u| SearchResult { unit: u.unit.clone(), score: cosine_similarity(&u.vector, query) })
            .collect();

        if let Some(bad) = scored.iter().find(|r| r.score.is_nan()) {
            return Err(RagError::Retrieval(format!(
                "similarity score is NaN for {} position {}",
                bad.unit.source_id, bad.unit.position
            )));
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for FlatIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.units.len()
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.search_sync(query, k)
    }
}

/// Builds [`FlatIndex`]es.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatIndexBuilder;

#[async_trait]
impl IndexBuilder for FlatIndexBuilder {
    async fn build(
        &self,
        dimensions: usize,
        units: Vec<EmbeddedUnit>,
    ) -> Result<Arc<dyn VectorIndex>> {
        Ok(Arc::new(FlatIndex::new(dimensions, units)?))
    }
}
