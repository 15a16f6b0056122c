use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::history::AccessHistory;
use crate::listener::{EvictionListener, EvictionReason};
use crate::metrics::Metrics;
use crate::monitor::PerformanceMonitor;
use crate::registry::Registry;
use crate::store::PersistentStore;

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// The internal, thread-safe core of the cache.
///
/// Lock order when more than one is needed: `registry`, then `history`.
/// Neither lock is ever held across an await point.
pub(crate) struct CacheShared {
  pub(crate) store: Arc<dyn PersistentStore>,
  pub(crate) monitor: Option<Arc<dyn PerformanceMonitor>>,
  pub(crate) listener: Option<Arc<dyn EvictionListener>>,
  pub(crate) config: RwLock<CacheConfig>,
  pub(crate) registry: Mutex<Registry>,
  pub(crate) history: Mutex<AccessHistory>,
  pub(crate) metrics: Metrics,
  /// Serialises structural operations (load, evict, clear).
  pub(crate) writer: tokio::sync::Mutex<()>,
  /// Cancelled by `dispose`; background tasks watch a child of it.
  pub(crate) shutdown: CancellationToken,
}

impl fmt::Debug for CacheShared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let config = self.config.read().clone();
    let entries = self.registry.lock().len();
    let history = self.history.lock().len();
    f.debug_struct("CacheShared")
      .field("config", &config)
      .field("entries", &entries)
      .field("history", &history)
      .field("metrics", &self.metrics.snapshot())
      .field("disposed", &self.shutdown.is_cancelled())
      .finish_non_exhaustive()
  }
}

impl Drop for CacheShared {
  fn drop(&mut self) {
    self.shutdown.cancel();
  }
}

impl CacheShared {
  pub(crate) fn new(
    config: CacheConfig,
    store: Arc<dyn PersistentStore>,
    monitor: Option<Arc<dyn PerformanceMonitor>>,
    listener: Option<Arc<dyn EvictionListener>>,
  ) -> Self {
    Self {
      store,
      monitor,
      listener,
      history: Mutex::new(AccessHistory::new(config.history_limit)),
      config: RwLock::new(config),
      registry: Mutex::new(Registry::new()),
      metrics: Metrics::new(),
      writer: tokio::sync::Mutex::new(()),
      shutdown: CancellationToken::new(),
    }
  }

  /// Hit and miss rates: the monitor's if it has seen traffic, then ours.
  pub(crate) fn lookup_rates(&self) -> (f64, f64) {
    if let Some(monitor) = &self.monitor {
      let metrics = monitor.metrics();
      if metrics.total_accesses > 0 {
        return (metrics.hit_rate, metrics.miss_rate);
      }
    }
    self.metrics.lookup_rates().unwrap_or((0.0, 0.0))
  }

  pub(crate) fn notify_evicted(&self, entries: &[CacheEntry], reason: EvictionReason) {
    if let Some(listener) = &self.listener {
      for entry in entries {
        listener.on_evict(entry, reason);
      }
    }
  }
}
