use crate::compression::{self, SizeEstimate};
use crate::priority;
use crate::record::{self, DomainRecord, DomainType};
use crate::time;

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

/// Records not synchronised within this window are considered stale.
pub const STALE_AFTER_DAYS: i64 = 7;

/// Metadata the cache keeps for one domain item.
///
/// Entries handed out by the cache are owned copies; mutating them has no
/// effect on the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
  pub id: String,
  #[serde(rename = "type")]
  pub domain: DomainType,
  /// Estimated bytes charged against the budget (after compression).
  pub size: u64,
  /// Estimated bytes before compression.
  pub original_size: u64,
  pub last_accessed: DateTime<Utc>,
  /// Always at least 1.
  pub access_count: u64,
  /// Always within `[0.1, 1.0]`.
  pub priority: f64,
  pub dependencies: BTreeSet<String>,
  pub tags: BTreeSet<String>,
  pub is_favorite: bool,
  pub last_synced: Option<DateTime<Utc>>,
  pub is_stale: bool,
  /// In `(0, 1]` with compression enabled, exactly 1.0 otherwise.
  pub compression_ratio: f64,
  /// The estimator's ratio for this payload, kept so compression can be
  /// toggled without reloading.
  #[serde(skip)]
  pub(crate) estimated_ratio: f64,
  /// Admission order, used as the final eviction tie-break.
  pub(crate) sequence: u64,
}

impl CacheEntry {
  /// Builds the metadata for a freshly loaded record.
  ///
  /// Returns `None` when the record carries no usable id.
  pub(crate) fn from_record(
    record: &DomainRecord,
    compression_enabled: bool,
    now: DateTime<Utc>,
    sequence: u64,
  ) -> Option<Self> {
    let id = record.id()?;
    let payload = record.to_json();
    let SizeEstimate {
      original,
      size,
      ratio,
    } = compression::estimate_item_size(&payload, compression_enabled);
    let last_synced = record.last_synced();
    let last_accessed = match record.get("lastAccessed").filter(|raw| !raw.is_null()) {
      Some(raw) => time::parse_timestamp(raw).unwrap_or_else(|| {
        warn!(id = %id, value = %raw, "unreadable lastAccessed, treating entry as idle");
        DateTime::<Utc>::UNIX_EPOCH
      }),
      None => record.last_used().unwrap_or(now),
    };
    let access_count = record
      .get("accessCount")
      .and_then(serde_json::Value::as_u64)
      .unwrap_or(1)
      .max(1);

    Some(Self {
      id,
      domain: record::classify(record),
      size,
      original_size: original,
      last_accessed,
      access_count,
      priority: priority::initial_priority(record, now),
      dependencies: record.dependencies(),
      tags: record.tags(),
      is_favorite: record.is_favorite(),
      last_synced,
      is_stale: is_stale(last_synced, now),
      compression_ratio: ratio,
      estimated_ratio: compression::estimate_compression_ratio(&payload),
      sequence,
    })
  }

  /// Registers one more access at `now`.
  pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
    self.access_count = self.access_count.saturating_add(1);
    self.last_accessed = now;
    self.priority = priority::recalculate_priority(self, now);
  }

  /// Refreshes the derived fields (priority and staleness).
  pub(crate) fn refresh(&mut self, now: DateTime<Utc>) {
    self.priority = priority::recalculate_priority(self, now);
    self.is_stale = is_stale(self.last_synced, now);
  }

  /// Re-derives the charged size after compression is switched on or off.
  pub(crate) fn apply_compression(&mut self, enabled: bool) {
    if enabled {
      self.compression_ratio = self.estimated_ratio;
      self.size = compression::compressed_size(self.original_size, self.estimated_ratio);
    } else {
      self.compression_ratio = 1.0;
      self.size = self.original_size;
    }
  }

  /// Bytes saved by compression for this entry.
  #[inline]
  pub fn space_saved(&self) -> u64 {
    self.original_size.saturating_sub(self.size)
  }
}

/// An item is stale if it has never been synchronised or the last sync is
/// older than [`STALE_AFTER_DAYS`].
pub(crate) fn is_stale(last_synced: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
  match last_synced {
    Some(synced) => now.signed_duration_since(synced) > Duration::days(STALE_AFTER_DAYS),
    None => true,
  }
}

#[cfg(test)]
pub(crate) fn test_entry(id: &str, sequence: u64) -> CacheEntry {
  let now = time::now();
  CacheEntry {
    id: id.to_string(),
    domain: DomainType::Recipe,
    size: 100,
    original_size: 100,
    last_accessed: now,
    access_count: 1,
    priority: 0.5,
    dependencies: BTreeSet::new(),
    tags: BTreeSet::new(),
    is_favorite: false,
    last_synced: Some(now),
    is_stale: false,
    compression_ratio: 1.0,
    estimated_ratio: 1.0,
    sequence,
  }
}
