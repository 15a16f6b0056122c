//! Eviction priority scoring. Higher scores are kept longer.

use crate::entry::CacheEntry;
use crate::record::DomainRecord;
use crate::time;

use chrono::{DateTime, Utc};

pub const MIN_PRIORITY: f64 = 0.1;
pub const MAX_PRIORITY: f64 = 1.0;

const BASE_PRIORITY: f64 = 0.5;

// Initial scoring, from the record itself.
const ORDER_COUNT_THRESHOLD: u64 = 5;
const POPULAR_BONUS: f64 = 0.2;
const FAVORITE_BONUS: f64 = 0.15;
const RECENTLY_USED_BONUS: f64 = 0.1;
const RECENTLY_USED_DAYS: f64 = 7.0;
const HIGH_RATING: f64 = 4.0;
const HIGH_RATING_BONUS: f64 = 0.1;

// Recalculation, from observed usage.
const FREQUENCY_WEIGHT: f64 = 0.1;
const MAX_FREQUENCY_BONUS: f64 = 0.3;
const ACCESSED_TODAY_BONUS: f64 = 0.2;
const ACCESSED_THIS_WEEK_BONUS: f64 = 0.1;
const NEGLECTED_DAYS: f64 = 30.0;
const NEGLECTED_PENALTY: f64 = 0.2;
const SMALL_ENTRY_BYTES: u64 = 1024;
const LARGE_ENTRY_BYTES: u64 = 10 * 1024;
const SIZE_ADJUSTMENT: f64 = 0.05;

#[inline]
fn clamp(priority: f64) -> f64 {
  if priority.is_nan() {
    return MIN_PRIORITY;
  }
  priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Scores a record that has just been admitted, before any access has been
/// observed.
pub fn initial_priority(record: &DomainRecord, now: DateTime<Utc>) -> f64 {
  let mut priority = BASE_PRIORITY;

  if record.order_count() > ORDER_COUNT_THRESHOLD {
    priority += POPULAR_BONUS;
  }
  if record.is_favorite() {
    priority += FAVORITE_BONUS;
  }
  if record
    .last_used()
    .is_some_and(|used| time::days_between(used, now) < RECENTLY_USED_DAYS)
  {
    priority += RECENTLY_USED_BONUS;
  }
  if record.rating().is_some_and(|r| r >= HIGH_RATING) {
    priority += HIGH_RATING_BONUS;
  }

  clamp(priority)
}

/// Rescores an entry from its access pattern and size.
pub fn recalculate_priority(entry: &CacheEntry, now: DateTime<Utc>) -> f64 {
  let days_idle = time::days_between(entry.last_accessed, now);
  let access_frequency = entry.access_count as f64 / days_idle.max(1.0);

  let mut priority = BASE_PRIORITY + (access_frequency * FREQUENCY_WEIGHT).min(MAX_FREQUENCY_BONUS);

  if days_idle < 1.0 {
    priority += ACCESSED_TODAY_BONUS;
  } else if days_idle < 7.0 {
    priority += ACCESSED_THIS_WEEK_BONUS;
  } else if days_idle > NEGLECTED_DAYS {
    priority -= NEGLECTED_PENALTY;
  }

  if entry.size < SMALL_ENTRY_BYTES {
    priority += SIZE_ADJUSTMENT;
  } else if entry.size > LARGE_ENTRY_BYTES {
    priority -= SIZE_ADJUSTMENT;
  }

  clamp(priority)
}
