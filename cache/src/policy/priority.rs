use super::{EvictionPolicy, SelectionContext};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Evicts the lowest-priority entries first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityPolicy;

impl EvictionPolicy for PriorityPolicy {
  fn name(&self) -> &'static str {
    "priority"
  }

  fn compare(&self, a: &CacheEntry, b: &CacheEntry, _ctx: &SelectionContext) -> Ordering {
    a.priority.total_cmp(&b.priority)
  }
}
