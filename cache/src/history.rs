use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One access attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
  pub item_id: String,
  pub timestamp: DateTime<Utc>,
  /// Whether the id was present in the registry at the time.
  pub hit: bool,
}

/// A bounded, time-ordered log of access attempts.
///
/// Once the log grows past its limit it is compacted down to the most recent
/// half, so compaction cost is amortised over `limit / 2` appends.
#[derive(Debug)]
pub(crate) struct AccessHistory {
  records: VecDeque<AccessRecord>,
  limit: usize,
}

impl AccessHistory {
  pub(crate) fn new(limit: usize) -> Self {
    Self {
      records: VecDeque::new(),
      limit: limit.max(1),
    }
  }

  pub(crate) fn push(&mut self, record: AccessRecord) {
    self.records.push_back(record);
    if self.records.len() > self.limit {
      self.compact();
    }
  }

  /// Keeps only the most recent half of the configured limit.
  fn compact(&mut self) {
    let keep = self.limit / 2;
    let drop = self.records.len().saturating_sub(keep);
    self.records.drain(..drop);
  }

  /// Changes the limit, compacting immediately if already over it.
  pub(crate) fn set_limit(&mut self, limit: usize) {
    self.limit = limit.max(1);
    if self.records.len() > self.limit {
      self.compact();
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.records.len()
  }

  pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &AccessRecord> {
    self.records.iter()
  }

  pub(crate) fn snapshot(&self) -> Vec<AccessRecord> {
    self.records.iter().cloned().collect()
  }

  pub(crate) fn clear(&mut self) {
    self.records.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: usize) -> AccessRecord {
    AccessRecord {
      item_id: format!("item-{id}"),
      timestamp: Utc::now(),
      hit: true,
    }
  }

  #[test]
  fn compacts_to_most_recent_half() {
    let mut history = AccessHistory::new(10);
    for i in 0..10 {
      history.push(record(i));
    }
    assert_eq!(history.len(), 10);

    history.push(record(10));
    assert_eq!(history.len(), 5);
    let ids: Vec<_> = history.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, ["item-6", "item-7", "item-8", "item-9", "item-10"]);
  }

  #[test]
  fn shrinking_the_limit_compacts() {
    let mut history = AccessHistory::new(100);
    for i in 0..40 {
      history.push(record(i));
    }
    history.set_limit(20);
    assert_eq!(history.len(), 10);
    assert_eq!(history.iter().last().unwrap().item_id, "item-39");
  }
}
