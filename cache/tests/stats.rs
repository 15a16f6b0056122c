mod common;

use common::{builder, days_ago, ingredient, recipe, with, FakeStore};
use pretty_assertions::assert_eq;
use recipe_cache::{CacheError, DomainType, EvictionStrategy, EvictionTarget, HealthStatus};
use serde_json::json;

#[tokio::test]
async fn test_empty_cache_stats() {
  let store = FakeStore::new();
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.entry_count, 0);
  assert_eq!(stats.staleness_rate, 0.0);
  assert_eq!(stats.utilization_rate, 0.0);
  assert_eq!(stats.fragmentation_rate, 0.0);
  let compression = stats.compression.unwrap();
  assert!(compression.enabled);
  assert_eq!(compression.space_saved, 0);
  assert_eq!(compression.average_ratio, 1.0);
}

#[tokio::test]
async fn test_stats_merge_store_and_registry_figures() {
  let store = FakeStore::new();
  store.add(
    DomainType::Recipe,
    [
      recipe("a", &["gin"]),
      with(recipe("b", &["gin"]), json!({"lastSynced": days_ago(9)})),
    ],
  );
  store.add(DomainType::Ingredient, [ingredient("gin"), ingredient("rum")]);
  let cache = builder(&store).max_entries(8).build().unwrap();
  cache.initialize().await.unwrap();

  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.storage.total_items, 4);
  assert_eq!(stats.storage.per_type[&DomainType::Ingredient].count, 2);
  assert_eq!(stats.entry_count, 4);
  assert_eq!(stats.stale_count, 1);
  assert_eq!(stats.staleness_rate, 0.25);
  assert_eq!(stats.utilization_rate, 0.5);
  assert!(stats.size_utilization_rate > 0.0);

  let entries = cache.get_cache_entries();
  let saved: u64 = entries.iter().map(|e| e.original_size - e.size).sum();
  let compression = stats.compression.unwrap();
  assert_eq!(compression.space_saved, saved);
  assert!(compression.average_ratio < 1.0);
}

#[tokio::test]
async fn test_toggling_compression_reprices_entries() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("a", &["gin", "lime"])]);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();
  let compressed = cache.get_entry("a").unwrap();
  assert!(compressed.size < compressed.original_size);

  cache.enable_compression(false);
  let raw = cache.get_entry("a").unwrap();
  assert_eq!(raw.compression_ratio, 1.0);
  assert_eq!(raw.size, raw.original_size);
  let stats = cache.get_cache_stats().await.unwrap();
  assert!(stats.compression.is_none());
  assert_eq!(stats.cached_size, raw.original_size);

  cache.enable_compression(true);
  assert_eq!(cache.get_entry("a").unwrap(), compressed);
}

#[tokio::test]
async fn test_fragmentation_reflects_evicted_slots() {
  let records = (0..4).map(|i| recipe(&format!("r{i}"), &["gin"]));
  let store = FakeStore::with(DomainType::Recipe, records);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  cache
    .evict(EvictionStrategy::Lru, EvictionTarget::Count(1))
    .await
    .unwrap();
  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.fragmentation_rate, 0.25);
}

#[tokio::test]
async fn test_stats_failure_is_a_read_error() {
  let store = FakeStore::new();
  store.fail_stats();
  let cache = builder(&store).build().unwrap();

  let error = cache.get_cache_stats().await.unwrap_err();
  assert!(matches!(error, CacheError::StorageRead { domain: None, .. }));
  assert!(cache.get_cache_health().await.is_err());
}

#[tokio::test]
async fn test_health_escalates_when_over_budget() {
  let records = (0..10).map(|i| recipe(&format!("r{i}"), &["gin"]));
  let store = FakeStore::with(DomainType::Recipe, records);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  let health = cache.get_cache_health().await.unwrap();
  assert_eq!(health.status, HealthStatus::Healthy);
  assert!(health.issues.is_empty());

  cache.set_max_entries(10).unwrap();
  assert_eq!(cache.get_cache_health().await.unwrap().status, HealthStatus::Warning);

  cache.set_max_entries(5).unwrap();
  let health = cache.get_cache_health().await.unwrap();
  assert_eq!(health.status, HealthStatus::Critical);
  assert_eq!(health.stats.utilization_rate, 2.0);
}

#[tokio::test]
async fn test_health_flags_poor_hit_rate() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin"])]);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  for i in 0..25 {
    cache.record_access(&format!("missing-{i}"));
  }
  let health = cache.get_cache_health().await.unwrap();
  assert_eq!(health.status, HealthStatus::Warning);
  assert!(health.issues.iter().any(|issue| issue.contains("hit rate")));
}

#[tokio::test]
async fn test_clear_empties_everything_once() {
  let store = FakeStore::with(
    DomainType::Recipe,
    [recipe("a", &["gin"]), recipe("b", &["gin"])],
  );
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();
  cache.record_access("a");

  cache.clear_cache().await.unwrap();
  assert!(cache.is_empty());
  assert!(cache.get_access_history().is_empty());
  assert_eq!(store.clear_calls(), 1);
  assert!(!store.contains(DomainType::Recipe, "a"));
  assert_eq!(cache.metrics().clears, 1);

  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.storage.total_items, 0);
  assert_eq!(stats.fragmentation_rate, 0.0);
}

#[tokio::test]
async fn test_failed_clear_still_empties_local_state() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("a", &["gin"])]);
  store.fail_clear();
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();
  cache.record_access("a");

  let error = cache.clear_cache().await.unwrap_err();
  assert!(matches!(error, CacheError::StorageClear(_)));
  assert!(cache.is_empty());
  assert!(cache.get_access_history().is_empty());
  assert_eq!(store.clear_calls(), 1);
}
