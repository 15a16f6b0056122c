#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use recipe_cache::{
  CacheBuilder, DomainRecord, DomainType, MemoryStore, PersistentStore, StorageStats, StoreError,
};
use serde_json::{json, Value};

/// A `MemoryStore` wrapper that can be told to fail and counts what the
/// cache asked of it.
#[derive(Default)]
pub struct FakeStore {
  inner: MemoryStore,
  failing_reads: Mutex<HashSet<DomainType>>,
  failing_deletes: Mutex<HashSet<String>>,
  fail_clear: AtomicBool,
  fail_stats: AtomicBool,
  pub clear_calls: AtomicUsize,
  pub deleted: Mutex<Vec<(DomainType, String)>>,
}

impl FakeStore {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn with(domain: DomainType, records: impl IntoIterator<Item = Value>) -> Arc<Self> {
    let store = Self::new();
    store.add(domain, records);
    store
  }

  pub fn add(&self, domain: DomainType, records: impl IntoIterator<Item = Value>) {
    for record in records {
      self.inner.insert(domain, record);
    }
  }

  pub fn contains(&self, domain: DomainType, id: &str) -> bool {
    self.inner.contains(domain, id)
  }

  pub fn fail_reads(&self, domain: DomainType) {
    self.failing_reads.lock().unwrap().insert(domain);
  }

  pub fn heal_reads(&self) {
    self.failing_reads.lock().unwrap().clear();
  }

  pub fn fail_delete(&self, id: &str) {
    self.failing_deletes.lock().unwrap().insert(id.to_string());
  }

  pub fn fail_clear(&self) {
    self.fail_clear.store(true, Ordering::SeqCst);
  }

  pub fn fail_stats(&self) {
    self.fail_stats.store(true, Ordering::SeqCst);
  }

  pub fn clear_calls(&self) -> usize {
    self.clear_calls.load(Ordering::SeqCst)
  }

  pub fn deleted(&self) -> Vec<(DomainType, String)> {
    self.deleted.lock().unwrap().clone()
  }

  async fn read(&self, domain: DomainType) -> Result<Vec<DomainRecord>, StoreError> {
    if self.failing_reads.lock().unwrap().contains(&domain) {
      return Err(StoreError::new(format!("{domain} collection unavailable")));
    }
    self.inner.fetch(domain).await
  }

  async fn remove(&self, domain: DomainType, id: &str) -> Result<(), StoreError> {
    if self.failing_deletes.lock().unwrap().contains(id) {
      return Err(StoreError::new(format!("cannot delete {id}")));
    }
    self.deleted.lock().unwrap().push((domain, id.to_string()));
    self.inner.delete(domain, id).await
  }
}

#[async_trait]
impl PersistentStore for FakeStore {
  async fn get_cached_recipes(&self) -> Result<Vec<DomainRecord>, StoreError> {
    self.read(DomainType::Recipe).await
  }

  async fn get_cached_ingredients(&self) -> Result<Vec<DomainRecord>, StoreError> {
    self.read(DomainType::Ingredient).await
  }

  async fn get_cached_techniques(&self) -> Result<Vec<DomainRecord>, StoreError> {
    self.read(DomainType::Technique).await
  }

  async fn get_cached_menus(&self) -> Result<Vec<DomainRecord>, StoreError> {
    self.read(DomainType::Menu).await
  }

  async fn get_storage_stats(&self) -> Result<StorageStats, StoreError> {
    if self.fail_stats.load(Ordering::SeqCst) {
      return Err(StoreError::new("stats unavailable"));
    }
    self.inner.get_storage_stats().await
  }

  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Recipe, id).await
  }

  async fn delete_ingredient(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Ingredient, id).await
  }

  async fn delete_technique(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Technique, id).await
  }

  async fn delete_menu(&self, id: &str) -> Result<(), StoreError> {
    self.remove(DomainType::Menu, id).await
  }

  async fn clear_all_data(&self) -> Result<(), StoreError> {
    self.clear_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_clear.load(Ordering::SeqCst) {
      return Err(StoreError::new("storage is read-only"));
    }
    self.inner.clear_all_data().await
  }
}

// Helper to start a builder over a fake store.
pub fn builder(store: &Arc<FakeStore>) -> CacheBuilder {
  init_tracing();
  CacheBuilder::new(store.clone())
}

pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub fn now_rfc3339() -> String {
  Utc::now().to_rfc3339()
}

pub fn days_ago(days: i64) -> String {
  (Utc::now() - chrono::Duration::days(days)).to_rfc3339()
}

pub fn recipe(id: &str, ingredients: &[&str]) -> Value {
  json!({
    "id": id,
    "name": format!("Recipe {id}"),
    "ingredients": ingredients,
    "lastSynced": now_rfc3339(),
  })
}

pub fn ingredient(id: &str) -> Value {
  json!({
    "id": id,
    "category": "spirit",
    "price": 24.5,
    "lastSynced": now_rfc3339(),
  })
}

pub fn technique(id: &str) -> Value {
  json!({
    "id": id,
    "steps": ["add ice", "stir for 30 seconds", "strain"],
    "lastSynced": now_rfc3339(),
  })
}

pub fn menu(id: &str, items: &[&str]) -> Value {
  json!({
    "id": id,
    "items": items,
    "lastSynced": now_rfc3339(),
  })
}

/// Merges extra fields into a record.
pub fn with(mut record: Value, extra: Value) -> Value {
  if let (Some(target), Value::Object(fields)) = (record.as_object_mut(), extra) {
    target.extend(fields);
  }
  record
}
