//! Content index configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory of the on-disk index; the index lives in memory when unset
    pub index_path: Option<PathBuf>,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// JSON file of documents loaded at startup
    pub seed_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            writer_heap_size: 50_000_000, // 50MB
            seed_path: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        // tantivy rejects writer budgets below 15MB
        if self.writer_heap_size < 15_000_000 {
            return Err(format!(
                "writer_heap_size must be at least 15000000 bytes, got {}",
                self.writer_heap_size
            ));
        }
        Ok(())
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = Some(path);
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn seed_path(mut self, path: PathBuf) -> Self {
        self.config.seed_path = Some(path);
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
