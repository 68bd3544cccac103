//! Configuration for document indexing and context assembly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum unit size in characters; longer pages are split.
    pub chunk_size: usize,
    /// Number of overlapping characters when a piece has to be cut mid-word.
    pub chunk_overlap: usize,
    /// Number of units retrieved per query.
    pub top_k: usize,
    /// Minimum similarity score for retrieved units; unset keeps everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Number of most recent dialogue turns included in the prompt.
    pub history_window: usize,
    /// Attempts at building an index before an embedding failure is reported.
    pub embed_max_attempts: u32,
    /// Delay before the first rebuild retry; doubles on every further attempt.
    pub embed_retry_backoff_ms: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 150,
            top_k: 10,
            similarity_threshold: None,
            history_window: 2,
            embed_max_attempts: 3,
            embed_retry_backoff_ms: 200,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Delay before the given retry (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1).min(5));
        Duration::from_millis(self.embed_retry_backoff_ms.saturating_mul(factor))
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embed_max_attempts == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.embed_max_attempts == 0 {
            return Err(RagError::Config("embed_max_attempts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum unit size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap used when a piece is cut mid-word.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of units retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for retrieved units.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set how many recent dialogue turns go into the prompt.
    pub fn history_window(mut self, window: usize) -> Self {
        self.config.history_window = window;
        self
    }

    /// Set how often an index build is attempted on embedding failures.
    pub fn embed_max_attempts(mut self, attempts: u32) -> Self {
        self.config.embed_max_attempts = attempts;
        self
    }

    /// Set the initial backoff between index build attempts.
    pub fn embed_retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.embed_retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] when [`RagConfig::validate`] fails.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = RagConfig::default();
        assert_eq!(config.top_k, 10);
        assert_eq!(config.history_window, 2);
        assert!(config.similarity_threshold.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_inconsistent_values() {
        assert!(RagConfig::builder().chunk_size(100).chunk_overlap(100).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().embed_max_attempts(0).build().is_err());
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
    }

    #[test]
    fn retry_delay_doubles() {
        let config = RagConfig::builder().embed_retry_backoff(Duration::from_millis(100)).build().unwrap();
        assert_eq!(config.retry_delay(1), Duration::from_millis(100));
        assert_eq!(config.retry_delay(2), Duration::from_millis(200));
        assert_eq!(config.retry_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RagConfig = serde_json::from_str(r#"{ "top_k": 4 }"#).unwrap();
        assert_eq!(config.top_k, 4);
        assert_eq!(config.chunk_size, 1500);
    }
}
