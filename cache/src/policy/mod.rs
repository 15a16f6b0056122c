pub mod intelligent;
pub mod lfu;
pub mod lru;
pub mod priority;
pub mod size;

use crate::entry::CacheEntry;
use crate::error::ConfigError;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a policy may consult besides the entries themselves.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
  pub max_cache_size_bytes: u64,
}

/// How much has to go. Selection stops once both parts are satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overage {
  pub bytes: u64,
  pub count: usize,
}

impl Overage {
  pub fn bytes(bytes: u64) -> Self {
    Self { bytes, count: 0 }
  }

  pub fn count(count: usize) -> Self {
    Self { bytes: 0, count }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.bytes == 0 && self.count == 0
  }
}

/// A victim picked by [`select_victims`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Victim {
  pub id: String,
  pub size: u64,
}

/// A trait for eviction orderings.
///
/// A policy only ranks candidates; it never touches the registry. Whatever
/// it considers equal falls through to the shared tie-break in
/// [`select_victims`].
pub trait EvictionPolicy: Send + Sync {
  fn name(&self) -> &'static str;

  /// Returns `Ordering::Less` when `a` should be evicted before `b`.
  fn compare(&self, a: &CacheEntry, b: &CacheEntry, ctx: &SelectionContext) -> Ordering;
}

/// Shared tie-break: stale before fresh, non-favorite before favorite, then
/// admission order.
///
/// Favorites and recent items are only ever preferred here, never pinned.
fn tie_break(a: &CacheEntry, b: &CacheEntry) -> Ordering {
  b.is_stale
    .cmp(&a.is_stale)
    .then_with(|| a.is_favorite.cmp(&b.is_favorite))
    .then_with(|| a.sequence.cmp(&b.sequence))
}

/// Ranks `entries` with `policy` and takes victims from the front until the
/// overage is covered.
pub fn select_victims<'a, I>(
  policy: &dyn EvictionPolicy,
  entries: I,
  overage: Overage,
  ctx: &SelectionContext,
) -> Vec<Victim>
where
  I: IntoIterator<Item = &'a CacheEntry>,
{
  if overage.is_empty() {
    return Vec::new();
  }

  let mut candidates: Vec<&CacheEntry> = entries.into_iter().collect();
  candidates.sort_by(|a, b| policy.compare(a, b, ctx).then_with(|| tie_break(a, b)));

  let mut victims = Vec::new();
  let mut freed = 0u64;
  for entry in candidates {
    if freed >= overage.bytes && victims.len() >= overage.count {
      break;
    }
    freed = freed.saturating_add(entry.size);
    victims.push(Victim {
      id: entry.id.clone(),
      size: entry.size,
    });
  }
  victims
}

/// The eviction strategies a cache can be configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionStrategy {
  /// Least recently accessed first.
  Lru,
  /// Least frequently accessed first.
  Lfu,
  /// Largest first.
  SizeBased,
  /// Lowest priority first.
  Priority,
  /// Lowest composite of priority and size pressure first.
  #[default]
  Intelligent,
}

static LRU: lru::LruPolicy = lru::LruPolicy;
static LFU: lfu::LfuPolicy = lfu::LfuPolicy;
static SIZE: size::SizeBasedPolicy = size::SizeBasedPolicy;
static PRIORITY: priority::PriorityPolicy = priority::PriorityPolicy;
static INTELLIGENT: intelligent::IntelligentPolicy = intelligent::IntelligentPolicy;

impl EvictionStrategy {
  pub const ALL: [EvictionStrategy; 5] = [
    EvictionStrategy::Lru,
    EvictionStrategy::Lfu,
    EvictionStrategy::SizeBased,
    EvictionStrategy::Priority,
    EvictionStrategy::Intelligent,
  ];

  /// The policy implementing this strategy.
  pub fn policy(self) -> &'static dyn EvictionPolicy {
    match self {
      EvictionStrategy::Lru => &LRU,
      EvictionStrategy::Lfu => &LFU,
      EvictionStrategy::SizeBased => &SIZE,
      EvictionStrategy::Priority => &PRIORITY,
      EvictionStrategy::Intelligent => &INTELLIGENT,
    }
  }

  pub fn as_str(self) -> &'static str {
    self.policy().name()
  }
}

impl fmt::Display for EvictionStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EvictionStrategy {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let name = s.trim();
    EvictionStrategy::ALL
      .into_iter()
      .find(|strategy| strategy.as_str().eq_ignore_ascii_case(name))
      .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
  }
}
