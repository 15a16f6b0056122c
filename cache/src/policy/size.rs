use super::{EvictionPolicy, SelectionContext};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Evicts the largest entries first, freeing budget in the fewest removals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeBasedPolicy;

impl EvictionPolicy for SizeBasedPolicy {
  fn name(&self) -> &'static str {
    "size-based"
  }

  fn compare(&self, a: &CacheEntry, b: &CacheEntry, _ctx: &SelectionContext) -> Ordering {
    b.size.cmp(&a.size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entry::test_entry;
  use crate::policy::{select_victims, Overage};

  #[test]
  fn one_large_victim_covers_the_overage() {
    let small = test_entry("small", 0);
    let mut large = test_entry("large", 1);
    let mut medium = test_entry("medium", 2);
    large.size = 5_000;
    medium.size = 800;

    let ctx = SelectionContext {
      max_cache_size_bytes: 10_000,
    };
    let entries = [small, large, medium];
    let victims = select_victims(&SizeBasedPolicy, &entries, Overage::bytes(4_000), &ctx);
    assert_eq!(victims.len(), 1);
    assert_eq!(victims[0].id, "large");
  }
}
