use super::{EvictionPolicy, SelectionContext};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// How strongly size pressure pulls an entry towards eviction.
const SIZE_WEIGHT: f64 = 0.1;

/// Evicts by a composite of priority and size pressure, lowest first.
///
/// `score = priority - 0.1 * (size / max_cache_size_bytes)`
#[derive(Debug, Clone, Copy, Default)]
pub struct IntelligentPolicy;

impl IntelligentPolicy {
  pub fn composite_score(entry: &CacheEntry, ctx: &SelectionContext) -> f64 {
    let size_factor = if ctx.max_cache_size_bytes == 0 {
      0.0
    } else {
      entry.size as f64 / ctx.max_cache_size_bytes as f64
    };
    entry.priority - SIZE_WEIGHT * size_factor
  }
}

impl EvictionPolicy for IntelligentPolicy {
  fn name(&self) -> &'static str {
    "intelligent"
  }

  fn compare(&self, a: &CacheEntry, b: &CacheEntry, ctx: &SelectionContext) -> Ordering {
    Self::composite_score(a, ctx).total_cmp(&Self::composite_score(b, ctx))
  }
}
