//! Retrieval configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weights, thresholds and cache settings for content retrieval.
///
/// `combined_rank = fulltext_rank * fulltext_weight
///     + phrase_rank * phrase_weight
///     + fulltext_rank * content_rank_weight
///     + max(title_trigram * title_trigram_weight, content_trigram * content_trigram_weight)`
///
/// The bag-of-words rank feeds both the `fulltext_weight` and the
/// `content_rank_weight` terms. Existing rankings depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Weight of the bag-of-words full-text rank
    pub fulltext_weight: f32,

    /// Second weight applied to the same full-text rank ("content" term)
    pub content_rank_weight: f32,

    /// Weight of the phrase rank
    pub phrase_weight: f32,

    /// Weight of the title trigram similarity
    pub title_trigram_weight: f32,

    /// Weight of the content trigram similarity
    pub content_trigram_weight: f32,

    /// Results must score strictly above this
    pub min_combined_rank: f32,

    /// Fallback runs when the best primary score is below this
    pub fallback_trigger_rank: f32,

    /// Trigram similarity that makes a document a primary candidate
    pub trigram_candidate_threshold: f32,

    /// Maximum number of documents returned
    pub max_results: usize,

    /// Result cache time-to-live in milliseconds
    pub cache_ttl_ms: u64,

    /// Optional bound on cached queries (unbounded when unset)
    pub cache_max_capacity: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fulltext_weight: 2.0,
            content_rank_weight: 1.5,
            phrase_weight: 3.0,
            title_trigram_weight: 2.0,
            content_trigram_weight: 1.0,
            min_combined_rank: 0.01,
            fallback_trigger_rank: 0.1,
            trigram_candidate_threshold: 0.1,
            max_results: 5,
            cache_ttl_ms: 5 * 60 * 1000,
            cache_max_capacity: None,
        }
    }
}

impl RetrievalConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Reject settings that would break result invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.max_results == 0 {
            return Err("max_results must be at least 1".to_string());
        }
        if self.cache_ttl_ms == 0 {
            return Err("cache_ttl_ms must be positive".to_string());
        }
        let weights = [
            ("fulltext_weight", self.fulltext_weight),
            ("content_rank_weight", self.content_rank_weight),
            ("phrase_weight", self.phrase_weight),
            ("title_trigram_weight", self.title_trigram_weight),
            ("content_trigram_weight", self.content_trigram_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        if !(0.0..=1.0).contains(&self.trigram_candidate_threshold) {
            return Err("trigram_candidate_threshold must be within [0, 1]".to_string());
        }
        Ok(())
    }
}

/// Builder for RetrievalConfig
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RetrievalConfig::default(),
        }
    }

    pub fn fulltext_weight(mut self, weight: f32) -> Self {
        self.config.fulltext_weight = weight;
        self
    }

    pub fn content_rank_weight(mut self, weight: f32) -> Self {
        self.config.content_rank_weight = weight;
        self
    }

    pub fn phrase_weight(mut self, weight: f32) -> Self {
        self.config.phrase_weight = weight;
        self
    }

    pub fn title_trigram_weight(mut self, weight: f32) -> Self {
        self.config.title_trigram_weight = weight;
        self
    }

    pub fn content_trigram_weight(mut self, weight: f32) -> Self {
        self.config.content_trigram_weight = weight;
        self
    }

    pub fn min_combined_rank(mut self, rank: f32) -> Self {
        self.config.min_combined_rank = rank;
        self
    }

    pub fn fallback_trigger_rank(mut self, rank: f32) -> Self {
        self.config.fallback_trigger_rank = rank;
        self
    }

    pub fn trigram_candidate_threshold(mut self, threshold: f32) -> Self {
        self.config.trigram_candidate_threshold = threshold;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn cache_max_capacity(mut self, capacity: u64) -> Self {
        self.config.cache_max_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> RetrievalConfig {
        self.config
    }
}

impl Default for RetrievalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
