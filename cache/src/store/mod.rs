//! The persistent store the cache sits on top of.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::record::{DomainRecord, DomainType};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Counts and sizes for one domain collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
  pub count: u64,
  pub size: u64,
  /// Items modified locally and not yet synchronised.
  pub pending_sync: u64,
}

/// Storage-wide statistics reported by the persistent store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
  pub total_items: u64,
  pub total_size: u64,
  pub per_type: BTreeMap<DomainType, TypeStats>,
}

/// The durable, offline-first storage engine.
///
/// The cache reads snapshots of every collection at startup, deletes
/// individual items it evicts, and wipes everything on clear. All methods
/// may suspend; errors are passed through to the cache's caller untouched.
#[async_trait]
pub trait PersistentStore: Send + Sync {
  async fn get_cached_recipes(&self) -> Result<Vec<DomainRecord>, StoreError>;
  async fn get_cached_ingredients(&self) -> Result<Vec<DomainRecord>, StoreError>;
  async fn get_cached_techniques(&self) -> Result<Vec<DomainRecord>, StoreError>;
  async fn get_cached_menus(&self) -> Result<Vec<DomainRecord>, StoreError>;

  async fn get_storage_stats(&self) -> Result<StorageStats, StoreError>;

  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError>;
  async fn delete_ingredient(&self, id: &str) -> Result<(), StoreError>;
  async fn delete_technique(&self, id: &str) -> Result<(), StoreError>;
  async fn delete_menu(&self, id: &str) -> Result<(), StoreError>;

  async fn clear_all_data(&self) -> Result<(), StoreError>;

  /// Reads the collection for `domain`.
  async fn fetch(&self, domain: DomainType) -> Result<Vec<DomainRecord>, StoreError> {
    match domain {
      DomainType::Recipe => self.get_cached_recipes().await,
      DomainType::Ingredient => self.get_cached_ingredients().await,
      DomainType::Technique => self.get_cached_techniques().await,
      DomainType::Menu => self.get_cached_menus().await,
    }
  }

  /// Deletes `id` from the collection for `domain`.
  async fn delete(&self, domain: DomainType, id: &str) -> Result<(), StoreError> {
    match domain {
      DomainType::Recipe => self.delete_recipe(id).await,
      DomainType::Ingredient => self.delete_ingredient(id).await,
      DomainType::Technique => self.delete_technique(id).await,
      DomainType::Menu => self.delete_menu(id).await,
    }
  }
}
