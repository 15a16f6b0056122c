use futures_util::future;

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::error::{CacheError, ConfigError, FailedDelete, Result};
use crate::history::AccessRecord;
use crate::listener::EvictionReason;
use crate::metrics::{self, MetricsSnapshot};
use crate::monitor::AccessOutcome;
use crate::policy::{self, EvictionStrategy, Overage, SelectionContext};
use crate::record::DomainType;
use crate::shared::CacheShared;
use crate::stats::{CacheHealth, CacheStats, RegistryFigures};
use crate::time;

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::{HashMap, HashMapExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How much an `evict` call should remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionTarget {
  /// At least this many bytes of estimated size.
  Bytes(u64),
  /// At least this many entries.
  Count(usize),
  /// Whatever exceeds the configured byte and entry budgets.
  OverBudget,
}

/// What an `evict` call removed.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionOutcome {
  pub strategy: EvictionStrategy,
  /// Evicted ids, in the order the strategy chose them.
  pub evicted: Vec<String>,
  pub freed_bytes: u64,
}

impl EvictionOutcome {
  fn nothing(strategy: EvictionStrategy) -> Self {
    Self {
      strategy,
      evicted: Vec::new(),
      freed_bytes: 0,
    }
  }
}

/// Per-domain results of a `load_metadata` pass.
#[derive(Debug, Default)]
pub struct LoadReport {
  /// Entries admitted, per successfully loaded collection.
  pub loaded: BTreeMap<DomainType, usize>,
  /// Records skipped because they carried no id.
  pub skipped: usize,
  /// Records skipped because another collection already holds their id.
  pub duplicates: usize,
  /// Collections whose read failed; each is a `CacheError::StorageRead`.
  pub failures: Vec<CacheError>,
}

impl LoadReport {
  /// True when every collection loaded.
  pub fn is_complete(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn total_loaded(&self) -> usize {
    self.loaded.values().sum()
  }

  pub fn failed_domains(&self) -> Vec<DomainType> {
    self
      .failures
      .iter()
      .filter_map(|failure| match failure {
        CacheError::StorageRead { domain, .. } => *domain,
        _ => None,
      })
      .collect()
  }
}

/// An adaptive, offline-first metadata cache for recipes, ingredients,
/// techniques and menus.
///
/// Cloning is cheap; every clone shares the same registry.
#[derive(Debug, Clone)]
pub struct RecipeCache {
  pub(crate) shared: Arc<CacheShared>,
}

impl RecipeCache {
  pub(crate) fn from_shared(shared: CacheShared) -> Self {
    Self {
      shared: Arc::new(shared),
    }
  }

  // --- Lifecycle ---

  /// Loads every collection from the persistent store, then brings the
  /// registry back within its budgets.
  pub async fn initialize(&self) -> Result<LoadReport> {
    let report = self.load_metadata().await?;
    if let Err(error) = self.enforce_budgets().await {
      warn!(error = %error, "budget enforcement after load did not complete cleanly");
      return Err(error);
    }
    info!(
      loaded = report.total_loaded(),
      skipped = report.skipped,
      failed = report.failures.len(),
      "recipe cache initialized"
    );
    Ok(report)
  }

  /// Stops background tasks and the attached monitor. The registry stays
  /// readable.
  pub fn dispose(&self) {
    if self.shared.shutdown.is_cancelled() {
      return;
    }
    self.shared.shutdown.cancel();
    if let Some(monitor) = &self.shared.monitor {
      monitor.stop_monitoring();
    }
    info!("recipe cache disposed");
  }

  pub fn is_disposed(&self) -> bool {
    self.shared.shutdown.is_cancelled()
  }

  /// Spawns the periodic priority refresh and health check.
  ///
  /// The task stops when `token` is cancelled or the cache is disposed.
  ///
  /// # Panics
  ///
  /// Panics when called outside a Tokio runtime.
  pub fn spawn_health_task(&self, interval: Duration, token: CancellationToken) -> JoinHandle<()> {
    crate::task::health::spawn(self.clone(), interval, token)
  }

  // --- Loading ---

  /// Rebuilds the entries of every collection from the persistent store.
  ///
  /// The four collections are read concurrently and independently: a failed
  /// read is recorded in the report and leaves that collection's entries
  /// untouched. Only when every read fails is the first failure returned as
  /// an error. No eviction happens here; see [`RecipeCache::initialize`].
  pub async fn load_metadata(&self) -> Result<LoadReport> {
    let _writer = self.shared.writer.lock().await;

    let store = &self.shared.store;
    let reads = DomainType::ALL.map(|domain| async move { (domain, store.fetch(domain).await) });
    let results = future::join_all(reads).await;

    let compression = self.shared.config.read().compression_enabled;
    let now = time::now();
    let mut report = LoadReport::default();

    {
      let mut registry = self.shared.registry.lock();
      for (domain, result) in results {
        let records = match result {
          Ok(records) => records,
          Err(source) => {
            warn!(domain = %domain, error = %source, "failed to load collection");
            metrics::bump(&self.shared.metrics.load_failures, 1);
            report.failures.push(CacheError::StorageRead {
              domain: Some(domain),
              source,
            });
            continue;
          }
        };

        registry.remove_origin(domain);
        let (mut loaded, mut skipped, mut duplicates) = (0usize, 0usize, 0usize);
        for record in &records {
          let sequence = registry.next_sequence();
          let Some(entry) = CacheEntry::from_record(record, compression, now, sequence) else {
            skipped += 1;
            continue;
          };
          match registry.origin_of(&entry.id) {
            Some(owner) if owner != domain => {
              warn!(id = %entry.id, domain = %domain, owner = %owner, "id already loaded from another collection");
              duplicates += 1;
            }
            _ => {
              registry.insert(entry, domain);
              loaded += 1;
            }
          }
        }
        if skipped > 0 {
          warn!(domain = %domain, skipped, "skipped records without an id");
        }
        report.skipped += skipped;
        report.duplicates += duplicates;
        debug!(domain = %domain, loaded, "collection loaded");
        metrics::bump(&self.shared.metrics.records_loaded, loaded as u64);
        metrics::bump(&self.shared.metrics.records_skipped, skipped as u64);
        report.loaded.insert(domain, loaded);
      }
    }

    if report.loaded.is_empty() && !report.failures.is_empty() {
      return Err(report.failures.swap_remove(0));
    }
    Ok(report)
  }

  // --- Reads ---

  /// Owned copies of every entry, in admission order.
  pub fn get_cache_entries(&self) -> Vec<CacheEntry> {
    self.shared.registry.lock().snapshot()
  }

  pub fn get_entry(&self, id: &str) -> Option<CacheEntry> {
    self.shared.registry.lock().get(id).cloned()
  }

  pub fn len(&self) -> usize {
    self.shared.registry.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.shared.registry.lock().is_empty()
  }

  pub fn get_access_history(&self) -> Vec<AccessRecord> {
    self.shared.history.lock().snapshot()
  }

  pub fn config(&self) -> CacheConfig {
    self.shared.config.read().clone()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  // --- Access tracking ---

  /// Records an access attempt for `id`.
  ///
  /// A known id has its count, recency and priority updated. Unknown ids are
  /// logged to the history as misses and never create an entry.
  pub fn record_access(&self, id: &str) -> AccessOutcome {
    let started = Instant::now();
    let now = time::now();

    let hit = {
      let mut registry = self.shared.registry.lock();
      match registry.get_mut(id) {
        Some(entry) => {
          entry.touch(now);
          true
        }
        None => false,
      }
    };

    self.shared.history.lock().push(AccessRecord {
      item_id: id.to_string(),
      timestamp: now,
      hit,
    });

    let outcome = if hit {
      metrics::bump(&self.shared.metrics.hits, 1);
      AccessOutcome::Hit
    } else {
      metrics::bump(&self.shared.metrics.misses, 1);
      AccessOutcome::Miss
    };

    if let Some(monitor) = &self.shared.monitor {
      monitor.record_access(outcome);
      monitor.record_response_time(started.elapsed());
    }
    outcome
  }

  /// Refreshes every entry's priority and staleness. Returns the number of
  /// entries visited.
  pub fn recalculate_priorities(&self) -> usize {
    let now = time::now();
    let mut registry = self.shared.registry.lock();
    let mut visited = 0;
    for entry in registry.iter_mut() {
      entry.refresh(now);
      visited += 1;
    }
    visited
  }

  // --- Eviction ---

  /// Evicts entries chosen by `strategy` until `target` is met.
  ///
  /// Victims leave the registry before the store is asked to delete them. A
  /// failed delete does not bring an entry back; the failures are returned
  /// as [`CacheError::StorageWrite`].
  pub async fn evict(
    &self,
    strategy: EvictionStrategy,
    target: EvictionTarget,
  ) -> Result<EvictionOutcome> {
    let _writer = self.shared.writer.lock().await;
    let reason = match target {
      EvictionTarget::OverBudget => EvictionReason::Budget,
      _ => EvictionReason::Requested,
    };
    self.evict_locked(strategy, target, reason).await
  }

  /// Evicts with the configured strategy until both budgets hold. A no-op
  /// when already within budget.
  pub async fn enforce_budgets(&self) -> Result<EvictionOutcome> {
    let strategy = self.shared.config.read().strategy;
    self.evict(strategy, EvictionTarget::OverBudget).await
  }

  async fn evict_locked(
    &self,
    strategy: EvictionStrategy,
    target: EvictionTarget,
    reason: EvictionReason,
  ) -> Result<EvictionOutcome> {
    let config = self.config();
    let ctx = SelectionContext {
      max_cache_size_bytes: config.max_cache_size_bytes,
    };

    let removed = {
      let mut registry = self.shared.registry.lock();
      let overage = match target {
        EvictionTarget::Bytes(bytes) => Overage::bytes(bytes),
        EvictionTarget::Count(count) => Overage::count(count),
        EvictionTarget::OverBudget => Overage {
          bytes: registry.total_size().saturating_sub(config.max_cache_size_bytes),
          count: registry.len().saturating_sub(config.max_entries),
        },
      };
      let victims = policy::select_victims(strategy.policy(), registry.iter(), overage, &ctx);
      victims
        .iter()
        .filter_map(|victim| registry.remove(&victim.id))
        .collect::<Vec<_>>()
    };

    if removed.is_empty() {
      return Ok(EvictionOutcome::nothing(strategy));
    }

    let counter = match reason {
      EvictionReason::Budget => &self.shared.metrics.evicted_by_budget,
      _ => &self.shared.metrics.evicted_by_request,
    };
    metrics::bump(counter, removed.len() as u64);

    let (entries, origins): (Vec<CacheEntry>, Vec<DomainType>) = removed.into_iter().unzip();
    self.shared.notify_evicted(&entries, reason);

    let mut failed = Vec::new();
    for (entry, origin) in entries.iter().zip(origins) {
      if let Err(error) = self.shared.store.delete(origin, &entry.id).await {
        warn!(id = %entry.id, domain = %origin, error = %error, "persistent store refused delete");
        failed.push(FailedDelete {
          id: entry.id.clone(),
          domain: origin,
          error,
        });
      }
    }

    let freed_bytes: u64 = entries.iter().map(|e| e.size).sum();
    info!(
      strategy = %strategy,
      reason = %reason,
      evicted = entries.len(),
      freed_bytes,
      "evicted entries"
    );

    let evicted: Vec<String> = entries.into_iter().map(|e| e.id).collect();
    if !failed.is_empty() {
      metrics::bump(&self.shared.metrics.delete_failures, failed.len() as u64);
      return Err(CacheError::StorageWrite {
        evicted,
        freed_bytes,
        failed,
      });
    }

    Ok(EvictionOutcome {
      strategy,
      evicted,
      freed_bytes,
    })
  }

  /// Wipes the persistent store, then the registry and the history.
  ///
  /// The store is asked exactly once. Local state is emptied even when the
  /// store fails, and that failure is returned.
  pub async fn clear_cache(&self) -> Result<()> {
    let _writer = self.shared.writer.lock().await;

    let result = self.shared.store.clear_all_data().await;

    let entries = {
      let mut registry = self.shared.registry.lock();
      let entries = registry.snapshot();
      registry.clear();
      entries
    };
    self.shared.history.lock().clear();
    self.shared.notify_evicted(&entries, EvictionReason::Cleared);
    metrics::bump(&self.shared.metrics.clears, 1);

    match result {
      Ok(()) => {
        info!(cleared = entries.len(), "cache cleared");
        Ok(())
      }
      Err(source) => {
        warn!(error = %source, "persistent store failed to clear");
        Err(CacheError::StorageClear(source))
      }
    }
  }

  // --- Reporting ---

  pub async fn get_cache_stats(&self) -> Result<CacheStats> {
    let storage = self
      .shared
      .store
      .get_storage_stats()
      .await
      .map_err(|source| CacheError::StorageRead { domain: None, source })?;

    let config = self.config();
    let figures = RegistryFigures::collect(&self.shared.registry.lock(), config.compression_enabled);
    Ok(CacheStats::assemble(storage, figures, &config, self.shared.lookup_rates()))
  }

  pub async fn get_cache_health(&self) -> Result<CacheHealth> {
    let stats = self.get_cache_stats().await?;
    let lookups = match &self.shared.monitor {
      Some(monitor) => monitor.metrics().total_accesses,
      None => 0,
    }
    .max(
      self.shared.metrics.hits.load(Ordering::Relaxed)
        + self.shared.metrics.misses.load(Ordering::Relaxed),
    );
    let performance = self.shared.monitor.as_ref().map(|m| m.performance_summary());
    Ok(CacheHealth::assess(stats, lookups, performance))
  }

  // --- Configuration ---

  /// Switches compression estimates on or off, re-pricing every entry.
  pub fn enable_compression(&self, enabled: bool) {
    self.shared.config.write().compression_enabled = enabled;
    self.shared.registry.lock().apply_compression(enabled);
    debug!(enabled, "compression toggled");
  }

  /// Selects the strategy used by `enforce_budgets`. Unknown names are
  /// rejected and the current strategy is kept.
  pub fn set_cache_strategy(&self, name: &str) -> Result<(), ConfigError> {
    let strategy = name.parse::<EvictionStrategy>().map_err(|error| {
      warn!(strategy = name, "rejected unknown eviction strategy");
      error
    })?;
    self.shared.config.write().strategy = strategy;
    debug!(strategy = %strategy, "eviction strategy changed");
    Ok(())
  }

  /// Sets the byte budget. Takes effect at the next `enforce_budgets`.
  pub fn set_max_cache_size(&self, bytes: u64) -> Result<(), ConfigError> {
    if bytes == 0 {
      warn!("rejected zero cache size budget");
      return Err(ConfigError::ZeroCacheSize);
    }
    self.shared.config.write().max_cache_size_bytes = bytes;
    Ok(())
  }

  /// Sets the entry budget. Takes effect at the next `enforce_budgets`.
  pub fn set_max_entries(&self, count: usize) -> Result<(), ConfigError> {
    if count == 0 {
      warn!("rejected zero entry budget");
      return Err(ConfigError::ZeroEntries);
    }
    self.shared.config.write().max_entries = count;
    Ok(())
  }

  pub fn set_history_limit(&self, limit: usize) -> Result<(), ConfigError> {
    if limit == 0 {
      return Err(ConfigError::ZeroHistoryLimit);
    }
    self.shared.config.write().history_limit = limit;
    self.shared.history.lock().set_limit(limit);
    Ok(())
  }

  pub fn enable_predictive(&self, enabled: bool) {
    self.shared.config.write().predictive_enabled = enabled;
  }

  // --- Prediction ---

  /// Ids most likely to be requested next, best first.
  ///
  /// Hits in the history score by recency (the latest access weighs 1, the
  /// oldest close to 0). Entries sharing a dependency with the most recently
  /// hit entry get a bonus of 1. That entry itself is never suggested.
  pub fn predict_next(&self, limit: usize) -> Vec<String> {
    if limit == 0 || !self.shared.config.read().predictive_enabled {
      return Vec::new();
    }

    let registry = self.shared.registry.lock();
    let history = self.shared.history.lock();

    let anchor = history.iter().rev().find(|r| r.hit).map(|r| r.item_id.as_str());
    let anchor_deps = anchor.and_then(|id| registry.get(id)).map(|e| &e.dependencies);

    let mut scores: HashMap<&str, f64> = HashMap::new();
    let len = history.len() as f64;
    for (position, record) in history.iter().enumerate() {
      if record.hit && registry.get(&record.item_id).is_some() {
        *scores.entry(record.item_id.as_str()).or_default() += (position + 1) as f64 / len;
      }
    }
    if let Some(deps) = anchor_deps.filter(|deps| !deps.is_empty()) {
      for entry in registry.iter() {
        if !entry.dependencies.is_disjoint(deps) {
          *scores.entry(entry.id.as_str()).or_default() += 1.0;
        }
      }
    }

    let mut ranked: Vec<(&str, f64)> = scores
      .into_iter()
      .filter(|(id, _)| Some(*id) != anchor)
      .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
      .into_iter()
      .take(limit)
      .map(|(id, _)| id.to_string())
      .collect()
  }
}
