use crate::entry::CacheEntry;

use std::fmt;

/// Describes the reason an entry was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The entry was removed to bring the cache back within its budgets.
  Budget,
  /// The entry was removed by an explicit `evict` call.
  Requested,
  /// The whole cache was cleared.
  Cleared,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Budget => write!(f, "evicted to satisfy cache budgets"),
      EvictionReason::Requested => write!(f, "evicted on request"),
      EvictionReason::Cleared => write!(f, "cache cleared"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when entries are removed.
///
/// `on_evict` runs synchronously once the entry has left the registry. On
/// eviction that is before the persistent store is asked to delete it; on
/// a clear the store has already been wiped. Keep it cheap.
pub trait EvictionListener: Send + Sync {
  fn on_evict(&self, entry: &CacheEntry, reason: EvictionReason);
}

impl<F> EvictionListener for F
where
  F: Fn(&CacheEntry, EvictionReason) + Send + Sync,
{
  fn on_evict(&self, entry: &CacheEntry, reason: EvictionReason) {
    self(entry, reason)
  }
}
