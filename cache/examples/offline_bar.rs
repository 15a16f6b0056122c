use recipe_cache::{
  CacheBuilder, CacheEntry, DomainType, EvictionReason, EvictionStrategy, EvictionTarget,
  LatencyMonitor, MemoryStore,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// A listener that just prints evicted entries.
fn report_eviction(entry: &CacheEntry, reason: EvictionReason) {
  println!(
    "[Listener] {} '{}' removed ({} bytes): {}",
    entry.domain, entry.id, entry.size, reason
  );
}

#[tokio::main]
async fn main() -> recipe_cache::Result<()> {
  tracing_subscriber::fmt().with_env_filter("recipe_cache=debug").init();

  println!("--- Offline bar: a small cache over an in-memory store ---");

  let store = Arc::new(MemoryStore::new());
  store.insert(
    DomainType::Recipe,
    json!({"id": "negroni", "ingredients": ["gin", "campari", "vermouth"], "isFavorite": true}),
  );
  store.insert(
    DomainType::Recipe,
    json!({"id": "gimlet", "ingredients": ["gin", "lime"], "orderCount": 9}),
  );
  store.insert(
    DomainType::Recipe,
    json!({"id": "daiquiri", "ingredients": ["rum", "lime", "sugar"]}),
  );
  store.insert(
    DomainType::Ingredient,
    json!({"id": "campari", "category": "bitter", "price": 28.0}),
  );
  store.insert(
    DomainType::Technique,
    json!({"id": "stir", "steps": ["ice", "stir", "strain"]}),
  );
  store.insert(
    DomainType::Menu,
    json!({"id": "aperitivo", "items": ["negroni", "gimlet"]}),
  );

  let monitor = Arc::new(LatencyMonitor::new());
  let cache = CacheBuilder::new(store.clone())
    .max_entries(5)
    .predictive(true)
    .monitor(monitor)
    .eviction_listener(report_eviction)
    .build()?;

  // Six records against a budget of five: one is evicted on startup.
  let report = cache.initialize().await?;
  println!("\nLoaded {} entries, {} left after budgets.", report.total_loaded(), cache.len());

  let token = CancellationToken::new();
  let health = cache.spawn_health_task(Duration::from_millis(100), token.clone());

  for id in ["negroni", "gimlet", "negroni", "sidecar"] {
    println!("access {id}: {:?}", cache.record_access(id));
  }
  println!("Likely next: {:?}", cache.predict_next(3));

  println!("\nSwitching to size-based eviction and freeing 1 KiB...");
  cache.set_cache_strategy("size-based")?;
  let outcome = cache
    .evict(EvictionStrategy::SizeBased, EvictionTarget::Bytes(1024))
    .await?;
  println!("Evicted {:?}, freed {} bytes.", outcome.evicted, outcome.freed_bytes);

  let stats = cache.get_cache_stats().await?;
  println!(
    "\n{} entries, hit rate {:.0}%, {:.0}% of entry budget used.",
    stats.entry_count,
    stats.hit_rate * 100.0,
    stats.utilization_rate * 100.0
  );
  println!("Health: {}", cache.get_cache_health().await?.status);

  tokio::time::sleep(Duration::from_millis(250)).await;
  token.cancel();
  let _ = health.await;
  cache.dispose();

  println!("\nExample finished.");
  Ok(())
}
