use super::{PersistentStore, StorageStats, TypeStats};
use crate::error::StoreError;
use crate::record::{DomainRecord, DomainType};

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

/// A volatile [`PersistentStore`] keeping every collection in memory.
///
/// Useful for tests and for running the cache without a real storage engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
  collections: RwLock<BTreeMap<DomainType, Vec<DomainRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a record to a collection, replacing any record with the same id.
  pub fn insert(&self, domain: DomainType, record: impl Into<DomainRecord>) {
    let record = record.into();
    let mut collections = self.collections.write();
    let items = collections.entry(domain).or_default();
    let id = record.id();
    match items.iter_mut().find(|r| id.is_some() && r.id() == id) {
      Some(existing) => *existing = record,
      None => items.push(record),
    }
  }

  pub fn contains(&self, domain: DomainType, id: &str) -> bool {
    self
      .collections
      .read()
      .get(&domain)
      .is_some_and(|items| items.iter().any(|r| r.id().as_deref() == Some(id)))
  }

  pub fn len(&self) -> usize {
    self.collections.read().values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn records(&self, domain: DomainType) -> Vec<DomainRecord> {
    self
      .collections
      .read()
      .get(&domain)
      .cloned()
      .unwrap_or_default()
  }

  fn remove(&self, domain: DomainType, id: &str) -> Result<(), StoreError> {
    let mut collections = self.collections.write();
    let items = collections.entry(domain).or_default();
    let before = items.len();
    items.retain(|r| r.id().as_deref() != Some(id));
    if items.len() == before {
      return Err(StoreError::new(format!("{domain} '{id}' not found")));
    }
    Ok(())
  }
}

fn is_pending_sync(record: &DomainRecord) -> bool {
  record.get("pendingSync").and_then(Value::as_bool).unwrap_or(false)
    || record.last_synced().is_none()
}

#[async_trait]
impl PersistentStore for MemoryStore {
  async fn get_cached_recipes(&self) -> Result<Vec<DomainRecord>, StoreError> {
    Ok(self.records(DomainType::Recipe))
  }

  async fn get_cached_ingredients(&self) -> Result<Vec<DomainRecord>, StoreError> {
    Ok(self.records(DomainType::Ingredient))
  }

  async fn get_cached_techniques(&self) -> Result<Vec<DomainRecord>, StoreError> {
    Ok(self.records(DomainType::Technique))
  }

  async fn get_cached_menus(&self) -> Result<Vec<DomainRecord>, StoreError> {
    Ok(self.records(DomainType::Menu))
  }

  async fn get_storage_stats(&self) -> Result<StorageStats, StoreError> {
    let collections = self.collections.read();
    let mut stats = StorageStats::default();
    for (domain, items) in collections.iter() {
      let type_stats = items.iter().fold(TypeStats::default(), |mut acc, record| {
        acc.count += 1;
        acc.size += record.to_json().len() as u64;
        acc.pending_sync += u64::from(is_pending_sync(record));
        acc
      });
      stats.total_items += type_stats.count;
      stats.total_size += type_stats.size;
      stats.per_type.insert(*domain, type_stats);
    }
    Ok(stats)
  }

  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Recipe, id)
  }

  async fn delete_ingredient(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Ingredient, id)
  }

  async fn delete_technique(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Technique, id)
  }

  async fn delete_menu(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Menu, id)
  }

  async fn clear_all_data(&self) -> Result<(), StoreError> {
    self.collections.write().clear();
    Ok(())
  }
}
