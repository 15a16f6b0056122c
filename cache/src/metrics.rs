use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// Lock-free counters describing what the cache has done since it was built.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Lookups ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Loading ---
  pub(crate) records_loaded: CachePadded<AtomicU64>,
  pub(crate) records_skipped: CachePadded<AtomicU64>,
  pub(crate) load_failures: CachePadded<AtomicU64>,

  // --- Eviction ---
  pub(crate) evicted_by_budget: CachePadded<AtomicU64>,
  pub(crate) evicted_by_request: CachePadded<AtomicU64>,
  pub(crate) delete_failures: CachePadded<AtomicU64>,
  pub(crate) clears: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      records_loaded: CachePadded::new(AtomicU64::new(0)),
      records_skipped: CachePadded::new(AtomicU64::new(0)),
      load_failures: CachePadded::new(AtomicU64::new(0)),
      evicted_by_budget: CachePadded::new(AtomicU64::new(0)),
      evicted_by_request: CachePadded::new(AtomicU64::new(0)),
      delete_failures: CachePadded::new(AtomicU64::new(0)),
      clears: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

#[inline]
pub(crate) fn bump(counter: &AtomicU64, by: u64) {
  counter.fetch_add(by, Ordering::Relaxed);
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Hit and miss ratios from the counters, or `None` before the first lookup.
  pub(crate) fn lookup_rates(&self) -> Option<(f64, f64)> {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total = hits + misses;
    if total == 0 {
      return None;
    }
    Some((hits as f64 / total as f64, misses as f64 / total as f64))
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: self.lookup_rates().map_or(0.0, |(hit, _)| hit),
      records_loaded: self.records_loaded.load(Ordering::Relaxed),
      records_skipped: self.records_skipped.load(Ordering::Relaxed),
      load_failures: self.load_failures.load(Ordering::Relaxed),
      evicted_by_budget: self.evicted_by_budget.load(Ordering::Relaxed),
      evicted_by_request: self.evicted_by_request.load(Ordering::Relaxed),
      delete_failures: self.delete_failures.load(Ordering::Relaxed),
      clears: self.clears.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's counters.
#[derive(Clone, PartialEq)]
pub struct MetricsSnapshot {
  /// Accesses to ids present in the registry.
  pub hits: u64,
  /// Accesses to ids the registry did not know.
  pub misses: u64,
  /// hits / (hits + misses), 0 before the first access.
  pub hit_ratio: f64,
  /// Records admitted by `load_metadata`.
  pub records_loaded: u64,
  /// Records skipped by `load_metadata` for lack of an id.
  pub records_skipped: u64,
  /// Domain collections that failed to load.
  pub load_failures: u64,
  /// Entries evicted to get back within budget.
  pub evicted_by_budget: u64,
  /// Entries evicted on explicit request.
  pub evicted_by_request: u64,
  /// Deletes the persistent store refused.
  pub delete_failures: u64,
  /// Completed `clear_cache` calls.
  pub clears: u64,
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("records_loaded", &self.records_loaded)
      .field("records_skipped", &self.records_skipped)
      .field("load_failures", &self.load_failures)
      .field("evicted_by_budget", &self.evicted_by_budget)
      .field("evicted_by_request", &self.evicted_by_request)
      .field("delete_failures", &self.delete_failures)
      .field("clears", &self.clears)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
