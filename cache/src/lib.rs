//! An adaptive, offline-first metadata cache for recipes, ingredients,
//! techniques and menus.
//!
//! The cache does not hold the records themselves; those live in a
//! [`PersistentStore`]. It keeps one [`CacheEntry`] of metadata per record
//! and uses it to decide what to drop when the device runs short on space.
//!
//! # Features
//! - **Compression-aware sizing**: record sizes are estimated from their JSON
//!   form and discounted by an estimated compression ratio.
//! - **Priority model**: favourites, frequently ordered and recently used
//!   items score higher and survive eviction longer.
//! - **Pluggable eviction**: LRU, LFU, size-based, priority and a composite
//!   "intelligent" strategy, selectable at runtime.
//! - **Observability**: hit/miss counters, stats, a health verdict and
//!   structured `tracing` logs.
//!
//! ```no_run
//! use std::sync::Arc;
//! use recipe_cache::{CacheBuilder, EvictionStrategy, MemoryStore};
//!
//! # async fn run() -> recipe_cache::Result<()> {
//! let cache = CacheBuilder::new(Arc::new(MemoryStore::new()))
//!   .max_entries(500)
//!   .strategy(EvictionStrategy::Lru)
//!   .build()?;
//! cache.initialize().await?;
//! cache.record_access("negroni");
//! let stats = cache.get_cache_stats().await?;
//! println!("{:.0}% full", stats.utilization_rate * 100.0);
//! # Ok(())
//! # }
//! ```

// Public modules that form the API
pub mod builder;
pub mod compression;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod monitor;
pub mod policy;
pub mod priority;
pub mod record;
pub mod stats;
pub mod store;

// Internal, crate-only modules
mod entry;
mod history;
mod registry;
mod shared;
mod task;
mod time;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use entry::{CacheEntry, STALE_AFTER_DAYS};
pub use error::{CacheError, ConfigError, FailedDelete, Result, StoreError};
pub use handles::{EvictionOutcome, EvictionTarget, LoadReport, RecipeCache};
pub use history::AccessRecord;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use monitor::{
  AccessOutcome, Alert, AlertThresholds, HealthStatus, LatencyMonitor, PerformanceMetrics,
  PerformanceMonitor, PerformanceSummary,
};
pub use policy::{EvictionPolicy, EvictionStrategy};
pub use record::{classify, DomainRecord, DomainType};
pub use stats::{CacheHealth, CacheStats, CompressionStats};
pub use store::{MemoryStore, PersistentStore, StorageStats, TypeStats};
