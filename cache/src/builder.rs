use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::handles::RecipeCache;
use crate::listener::EvictionListener;
use crate::monitor::PerformanceMonitor;
use crate::policy::EvictionStrategy;
use crate::shared::CacheShared;
use crate::store::PersistentStore;

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A builder for [`RecipeCache`] instances.
///
/// The persistent store is the only required collaborator. Everything else
/// starts from [`CacheConfig::default`].
pub struct CacheBuilder {
  config: CacheConfig,
  store: Arc<dyn PersistentStore>,
  monitor: Option<Arc<dyn PerformanceMonitor>>,
  monitoring_interval: Option<Duration>,
  listener: Option<Arc<dyn EvictionListener>>,
}

impl fmt::Debug for CacheBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("config", &self.config)
      .field("monitor", &self.monitor.is_some())
      .field("monitoring_interval", &self.monitoring_interval)
      .field("listener", &self.listener.is_some())
      .finish()
  }
}

impl CacheBuilder {
  pub fn new(store: Arc<dyn PersistentStore>) -> Self {
    Self {
      config: CacheConfig::default(),
      store,
      monitor: None,
      monitoring_interval: None,
      listener: None,
    }
  }

  /// Replaces the whole configuration, e.g. one read with
  /// [`CacheConfig::from_yaml_file`].
  pub fn config(mut self, config: CacheConfig) -> Self {
    self.config = config;
    self
  }

  /// Reads the configuration from a YAML file.
  #[cfg(feature = "yaml")]
  pub fn config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
    let config = CacheConfig::from_yaml_file(path)?;
    Ok(self.config(config))
  }

  /// Sets the byte budget, measured on estimated sizes.
  pub fn max_cache_size(mut self, bytes: u64) -> Self {
    self.config.max_cache_size_bytes = bytes;
    self
  }

  pub fn max_entries(mut self, count: usize) -> Self {
    self.config.max_entries = count;
    self
  }

  /// Sets the strategy `enforce_budgets` uses.
  pub fn strategy(mut self, strategy: EvictionStrategy) -> Self {
    self.config.strategy = strategy;
    self
  }

  pub fn compression(mut self, enabled: bool) -> Self {
    self.config.compression_enabled = enabled;
    self
  }

  pub fn predictive(mut self, enabled: bool) -> Self {
    self.config.predictive_enabled = enabled;
    self
  }

  /// Sets how many access records are kept before the history is compacted.
  pub fn history_limit(mut self, limit: usize) -> Self {
    self.config.history_limit = limit;
    self
  }

  /// Attaches a performance monitor. Accesses and lookup latencies are
  /// reported to it, and its view feeds the hit rate and health reports.
  pub fn monitor(mut self, monitor: Arc<dyn PerformanceMonitor>) -> Self {
    self.monitor = Some(monitor);
    self
  }

  /// Starts the attached monitor's own polling at `interval` on build.
  ///
  /// Needs a running tokio runtime when `build` is called.
  pub fn monitoring_interval(mut self, interval: Duration) -> Self {
    self.monitoring_interval = Some(interval);
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Builds the cache. Nothing is loaded until
  /// [`RecipeCache::initialize`] is called.
  pub fn build(self) -> Result<RecipeCache, ConfigError> {
    self.config.validate()?;

    if let (Some(monitor), Some(interval)) = (&self.monitor, self.monitoring_interval) {
      monitor.start_monitoring(interval);
    }

    let shared = CacheShared::new(self.config, self.store, self.monitor, self.listener);
    Ok(RecipeCache::from_shared(shared))
  }
}
