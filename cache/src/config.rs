//! Process-wide cache configuration.
//!
//! Configuration is never persisted: every process starts from
//! [`CacheConfig::default`] (or a file handed to the builder) and changes
//! are applied through the cache's setters.

use crate::error::ConfigError;
use crate::policy::EvictionStrategy;

use serde::{Deserialize, Serialize};

/// 50 MiB.
pub const DEFAULT_MAX_CACHE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_ENTRIES: usize = 1_000;
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CacheConfig {
  /// Byte budget, measured on estimated (post-compression) sizes.
  pub max_cache_size_bytes: u64,
  /// Entry-count budget.
  pub max_entries: usize,
  /// Strategy used when budgets are enforced.
  pub strategy: EvictionStrategy,
  /// Whether size estimates account for compression.
  pub compression_enabled: bool,
  /// Whether `predict_next` produces hints.
  pub predictive_enabled: bool,
  /// Ceiling of the access history before it is compacted.
  pub history_limit: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_cache_size_bytes: DEFAULT_MAX_CACHE_SIZE_BYTES,
      max_entries: DEFAULT_MAX_ENTRIES,
      strategy: EvictionStrategy::default(),
      compression_enabled: true,
      predictive_enabled: false,
      history_limit: DEFAULT_HISTORY_LIMIT,
    }
  }
}

impl CacheConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.max_cache_size_bytes == 0 {
      return Err(ConfigError::ZeroCacheSize);
    }
    if self.max_entries == 0 {
      return Err(ConfigError::ZeroEntries);
    }
    if self.history_limit == 0 {
      return Err(ConfigError::ZeroHistoryLimit);
    }
    Ok(())
  }

  /// Parses and validates a YAML document.
  ///
  /// Omitted keys keep their defaults; unknown keys are rejected.
  #[cfg(feature = "yaml")]
  pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
    let config: CacheConfig =
      serde_yaml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a YAML file.
  #[cfg(feature = "yaml")]
  pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
      .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
    Self::from_yaml_str(&source)
  }
}
