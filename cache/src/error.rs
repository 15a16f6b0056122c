use crate::record::DomainType;

use thiserror::Error;

/// Errors raised while validating or applying cache configuration.
///
/// A rejected configuration never replaces the one currently in effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// The strategy name did not match any known eviction strategy.
  #[error("unknown eviction strategy '{0}' (expected lru, lfu, size-based, priority or intelligent)")]
  UnknownStrategy(String),
  /// A byte budget of zero was requested.
  #[error("maximum cache size must be greater than zero")]
  ZeroCacheSize,
  /// An entry budget of zero was requested.
  #[error("maximum entry count must be greater than zero")]
  ZeroEntries,
  /// The access history ceiling was zero.
  #[error("access history limit must be greater than zero")]
  ZeroHistoryLimit,
  /// A configuration file could not be read or parsed.
  #[error("failed to load configuration: {0}")]
  Parse(String),
}

/// The error type reported by a [`PersistentStore`](crate::store::PersistentStore)
/// implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
  message: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  /// Wraps an underlying storage error.
  pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self {
      message: message.into(),
      source: Some(Box::new(source)),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// A delete that the persistent store refused during eviction.
#[derive(Debug)]
pub struct FailedDelete {
  pub id: String,
  pub domain: DomainType,
  pub error: StoreError,
}

/// The main error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
  /// Reading from the persistent store failed.
  ///
  /// `domain` is `None` for store-wide reads such as storage statistics.
  #[error("storage read failed{}: {source}", domain_suffix(.domain))]
  StorageRead {
    domain: Option<DomainType>,
    #[source]
    source: StoreError,
  },

  /// One or more deletes failed while evicting.
  ///
  /// The registry has already dropped every entry in `evicted`, including
  /// the ones listed in `failed`.
  #[error(
    "storage write failed for {} item(s) (evicted {} locally)",
    .failed.len(),
    .evicted.len()
  )]
  StorageWrite {
    evicted: Vec<String>,
    freed_bytes: u64,
    failed: Vec<FailedDelete>,
  },

  /// The persistent store could not be cleared.
  #[error("failed to clear persistent store: {0}")]
  StorageClear(#[source] StoreError),

  #[error(transparent)]
  Configuration(#[from] ConfigError),
}

fn domain_suffix(domain: &Option<DomainType>) -> String {
  domain.map(|d| format!(" for {d}s")).unwrap_or_default()
}

/// A specialized `Result` type for cache operations.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
