//! Offline embedding provider based on feature hashing.
//!
//! [`HashingEmbedder`] maps every lower-cased alphanumeric token of a text to
//! one of a fixed number of buckets and L2-normalises the bucket counts. It
//! needs no model files or network access and is fully deterministic, which
//! makes it the default for the CLI and for tests. It captures lexical
//! overlap only, not meaning.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default number of hash buckets.
pub const DEFAULT_HASH_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// A deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    name: String,
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder with the given number of buckets.
    pub fn new(dimensions: usize) -> Self {
        Self { name: format!("hashing-{dimensions}"), dimensions }
    }

    /// Embed synchronously; the async trait methods delegate here.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(RagError::embedding(&self.name, "dimensions must be greater than zero"));
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
