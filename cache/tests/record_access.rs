mod common;

use std::sync::Arc;

use common::{builder, recipe, with, FakeStore};
use pretty_assertions::assert_eq;
use recipe_cache::{AccessOutcome, DomainType, LatencyMonitor, PerformanceMonitor};
use serde_json::json;

#[tokio::test]
async fn test_repeated_access_counts_up_and_logs_history() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin", "lime"])]);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  let before = cache.get_entry("r1").unwrap();
  assert_eq!(before.access_count, 1);
  let history_before = cache.get_access_history().len();

  assert_eq!(cache.record_access("r1"), AccessOutcome::Hit);
  assert_eq!(cache.get_entry("r1").unwrap().access_count, 2);
  assert_eq!(cache.record_access("r1"), AccessOutcome::Hit);

  let after = cache.get_entry("r1").unwrap();
  assert_eq!(after.access_count, 3);
  assert!(after.last_accessed >= before.last_accessed);
  assert!((0.1..=1.0).contains(&after.priority));

  let history = cache.get_access_history();
  assert_eq!(history.len(), history_before + 2);
  assert!(history.iter().all(|r| r.item_id == "r1" && r.hit));
}

#[tokio::test]
async fn test_unknown_id_is_logged_without_phantom_entry() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin"])]);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  assert_eq!(cache.record_access("ghost"), AccessOutcome::Miss);
  assert!(cache.get_entry("ghost").is_none());
  assert_eq!(cache.len(), 1);

  let history = cache.get_access_history();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].item_id, "ghost");
  assert!(!history[0].hit);

  let metrics = cache.metrics();
  assert_eq!((metrics.hits, metrics.misses), (0, 1));
}

#[tokio::test]
async fn test_stale_idle_entry_recovers_priority_on_access() {
  let store = FakeStore::with(
    DomainType::Recipe,
    [with(
      recipe("dusty", &["gin"]),
      json!({"lastAccessed": "2020-01-01T00:00:00Z"}),
    )],
  );
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  cache.recalculate_priorities();
  let idle = cache.get_entry("dusty").unwrap().priority;
  cache.record_access("dusty");
  let touched = cache.get_entry("dusty").unwrap().priority;
  assert!(touched > idle, "{touched} should exceed {idle}");
}

#[tokio::test]
async fn test_history_compacts_to_half_its_limit() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin"])]);
  let cache = builder(&store).history_limit(10).build().unwrap();
  cache.initialize().await.unwrap();

  for _ in 0..10 {
    cache.record_access("r1");
  }
  assert_eq!(cache.get_access_history().len(), 10);

  cache.record_access("last");
  let history = cache.get_access_history();
  assert_eq!(history.len(), 5);
  assert_eq!(history.last().unwrap().item_id, "last");
}

#[tokio::test]
async fn test_attached_monitor_sees_every_access() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin"])]);
  let monitor = Arc::new(LatencyMonitor::new());
  let cache = builder(&store).monitor(monitor.clone()).build().unwrap();
  cache.initialize().await.unwrap();

  cache.record_access("r1");
  cache.record_access("nope");

  let metrics = monitor.metrics();
  assert_eq!(metrics.total_accesses, 2);
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.response_samples, 2);

  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.hit_rate, 0.5);
  assert_eq!(stats.miss_rate, 0.5);
}

#[tokio::test]
async fn test_hit_rate_falls_back_to_own_counters() {
  let store = FakeStore::with(DomainType::Recipe, [recipe("r1", &["gin"])]);
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();

  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!((stats.hit_rate, stats.miss_rate), (0.0, 0.0));

  for id in ["r1", "r1", "r1", "x"] {
    cache.record_access(id);
  }
  let stats = cache.get_cache_stats().await.unwrap();
  assert_eq!(stats.hit_rate, 0.75);
  assert_eq!(stats.miss_rate, 0.25);
}

#[tokio::test]
async fn test_predictions_follow_history_and_shared_ingredients() {
  let store = FakeStore::with(
    DomainType::Recipe,
    [
      recipe("negroni", &["gin", "campari"]),
      recipe("gimlet", &["gin", "lime"]),
      recipe("daiquiri", &["rum", "lime"]),
      recipe("mojito", &["rum", "mint"]),
    ],
  );
  let cache = builder(&store).predictive(true).build().unwrap();
  cache.initialize().await.unwrap();

  cache.record_access("mojito");
  cache.record_access("negroni");

  // gimlet shares gin with negroni; mojito was seen but less recently.
  assert_eq!(cache.predict_next(5), vec!["gimlet", "mojito"]);
  assert_eq!(cache.predict_next(1), vec!["gimlet"]);
  assert!(cache.predict_next(0).is_empty());
}

#[tokio::test]
async fn test_predictions_are_empty_when_disabled() {
  let store = FakeStore::with(
    DomainType::Recipe,
    [recipe("a", &["gin"]), recipe("b", &["gin"])],
  );
  let cache = builder(&store).build().unwrap();
  cache.initialize().await.unwrap();
  cache.record_access("a");
  assert!(cache.predict_next(3).is_empty());

  cache.enable_predictive(true);
  assert_eq!(cache.predict_next(3), vec!["b"]);
}
