//! Index configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::MAX_POSITIONS;
use crate::error::{GramdexError, Result};

/// Configuration of one [`crate::GramIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Prefix of every bucket the index owns.
    pub namespace: String,
    /// Symbols kept per document; the rest of the text is not indexed.
    pub max_symbols: usize,
    /// Symbols kept per query term.
    pub max_query_symbols: usize,
    /// How far a symbol of a fuzzy segment may drift from its expected position.
    pub fuzzy_distance: u16,
    /// How many symbols of a fuzzy segment may be missing.
    pub fuzzy_misses: usize,
    /// Segments of at most this many symbols always match exactly.
    pub exact_segment_len: usize,
    /// Merge iterations between deadline checks.
    pub poll_interval: usize,
    /// Same-page steps a lagging cursor tries before seeking.
    pub fast_steps: usize,
    /// Timeout applied when a search request sets none.
    pub default_timeout_ms: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            namespace: "gramdex".to_string(),
            max_symbols: MAX_POSITIONS - 1,
            max_query_symbols: 100,
            fuzzy_distance: 2,
            fuzzy_misses: 2,
            exact_segment_len: 4,
            poll_interval: 64,
            fast_steps: 4,
            default_timeout_ms: None,
        }
    }
}

impl IndexConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(GramdexError::invalid_config("namespace must not be empty"));
        }
        if self.max_symbols == 0 || self.max_symbols > MAX_POSITIONS {
            return Err(GramdexError::invalid_config(format!(
                "max_symbols must be in 1..={MAX_POSITIONS}, got {}",
                self.max_symbols
            )));
        }
        if self.max_query_symbols == 0 {
            return Err(GramdexError::invalid_config("max_query_symbols must be positive"));
        }
        if self.poll_interval == 0 {
            return Err(GramdexError::invalid_config("poll_interval must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`IndexConfig`].
#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn max_symbols(mut self, max_symbols: usize) -> Self {
        self.config.max_symbols = max_symbols;
        self
    }

    pub fn max_query_symbols(mut self, max_query_symbols: usize) -> Self {
        self.config.max_query_symbols = max_query_symbols;
        self
    }

    pub fn fuzzy(mut self, distance: u16, misses: usize) -> Self {
        self.config.fuzzy_distance = distance;
        self.config.fuzzy_misses = misses;
        self
    }

    pub fn exact_segment_len(mut self, len: usize) -> Self {
        self.config.exact_segment_len = len;
        self
    }

    pub fn poll_interval(mut self, iterations: usize) -> Self {
        self.config.poll_interval = iterations;
        self
    }

    pub fn fast_steps(mut self, steps: usize) -> Self {
        self.config.fast_steps = steps;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
