use super::{EvictionPolicy, SelectionContext};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Evicts the least frequently accessed entries first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LfuPolicy;

impl EvictionPolicy for LfuPolicy {
  fn name(&self) -> &'static str {
    "lfu"
  }

  fn compare(&self, a: &CacheEntry, b: &CacheEntry, _ctx: &SelectionContext) -> Ordering {
    a.access_count.cmp(&b.access_count)
  }
}
