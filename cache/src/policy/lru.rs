use super::{EvictionPolicy, SelectionContext};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Evicts the least recently accessed entries first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
  fn name(&self) -> &'static str {
    "lru"
  }

  fn compare(&self, a: &CacheEntry, b: &CacheEntry, _ctx: &SelectionContext) -> Ordering {
    a.last_accessed.cmp(&b.last_accessed)
  }
}
