mod common;

use common::{builder, recipe, FakeStore};
use pretty_assertions::assert_eq;
use recipe_cache::{CacheConfig, CacheError, ConfigError, DomainType, EvictionStrategy};

#[test]
fn test_builder_defaults() {
  let store = FakeStore::new();
  let cache = builder(&store).build().unwrap();
  assert_eq!(cache.config(), CacheConfig::default());
  assert_eq!(cache.config().max_cache_size_bytes, 50 * 1024 * 1024);
  assert_eq!(cache.config().max_entries, 1000);
}

#[test]
fn test_builder_rejects_zero_budgets() {
  let store = FakeStore::new();
  assert_eq!(
    builder(&store).max_entries(0).build().unwrap_err(),
    ConfigError::ZeroEntries
  );
  assert_eq!(
    builder(&store).max_cache_size(0).build().unwrap_err(),
    ConfigError::ZeroCacheSize
  );
  assert_eq!(
    builder(&store).history_limit(0).build().unwrap_err(),
    ConfigError::ZeroHistoryLimit
  );
}

#[test]
fn test_unknown_strategy_keeps_the_current_one() {
  let store = FakeStore::new();
  let cache = builder(&store).strategy(EvictionStrategy::Lfu).build().unwrap();

  let error = cache.set_cache_strategy("random").unwrap_err();
  assert_eq!(error, ConfigError::UnknownStrategy("random".into()));
  assert_eq!(cache.config().strategy, EvictionStrategy::Lfu);

  // Surfaces through the cache error type as a configuration error.
  let wrapped: CacheError = error.into();
  assert!(matches!(wrapped, CacheError::Configuration(_)));

  cache.set_cache_strategy("Size-Based").unwrap();
  assert_eq!(cache.config().strategy, EvictionStrategy::SizeBased);
}

#[test]
fn test_setters_reject_zero_and_keep_prior_values() {
  let store = FakeStore::new();
  let cache = builder(&store).max_entries(20).max_cache_size(4096).build().unwrap();

  assert_eq!(cache.set_max_entries(0), Err(ConfigError::ZeroEntries));
  assert_eq!(cache.set_max_cache_size(0), Err(ConfigError::ZeroCacheSize));
  assert_eq!(cache.set_history_limit(0), Err(ConfigError::ZeroHistoryLimit));
  assert_eq!(cache.config().max_entries, 20);
  assert_eq!(cache.config().max_cache_size_bytes, 4096);

  cache.set_max_entries(30).unwrap();
  cache.set_max_cache_size(8192).unwrap();
  cache.enable_predictive(true);
  let config = cache.config();
  assert_eq!(config.max_entries, 30);
  assert_eq!(config.max_cache_size_bytes, 8192);
  assert!(config.predictive_enabled);
}

#[tokio::test]
async fn test_configured_strategy_drives_enforcement() {
  let store = FakeStore::with(
    DomainType::Recipe,
    [
      recipe("short", &["gin"]),
      recipe("a-much-longer-identifier-for-a-bigger-record", &["gin", "campari", "vermouth"]),
    ],
  );
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  cache.set_cache_strategy("size-based").unwrap();
  cache.set_max_entries(1).unwrap();
  let outcome = cache.enforce_budgets().await.unwrap();
  assert_eq!(outcome.strategy, EvictionStrategy::SizeBased);
  assert_eq!(
    outcome.evicted,
    vec!["a-much-longer-identifier-for-a-bigger-record".to_string()]
  );
}

#[cfg(feature = "yaml")]
#[test]
fn test_config_file_feeds_the_builder() {
  use std::io::Write;

  let mut file = tempfile::NamedTempFile::new().unwrap();
  writeln!(
    file,
    "maxCacheSizeBytes: 1048576\nmaxEntries: 64\nstrategy: lru\npredictiveEnabled: true"
  )
  .unwrap();

  let store = FakeStore::new();
  let cache = builder(&store).config_file(file.path()).unwrap().build().unwrap();
  let config = cache.config();
  assert_eq!(config.max_cache_size_bytes, 1_048_576);
  assert_eq!(config.max_entries, 64);
  assert_eq!(config.strategy, EvictionStrategy::Lru);
  assert!(config.predictive_enabled);
  assert!(config.compression_enabled);
}

#[cfg(feature = "yaml")]
#[test]
fn test_missing_config_file_is_a_configuration_error() {
  let store = FakeStore::new();
  let dir = tempfile::tempdir().unwrap();
  let error = builder(&store)
    .config_file(dir.path().join("absent.yaml"))
    .unwrap_err();
  assert!(matches!(error, ConfigError::Parse(_)));
}
