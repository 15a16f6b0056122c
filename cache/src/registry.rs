use crate::entry::CacheEntry;
use crate::record::DomainType;

use ahash::{HashMap, HashMapExt};
use generational_arena::{Arena, Index};

/// The in-memory set of cache entries.
///
/// Entries live in an arena; a side map resolves stable string ids to arena
/// slots. Freed slots are recycled by later insertions, and the number of
/// slots currently left vacant is what the stats report as fragmentation.
#[derive(Debug)]
pub(crate) struct Registry {
  arena: Arena<CacheEntry>,
  index: HashMap<String, Index>,
  /// Collection each entry was loaded from, used to route deletes.
  origin: HashMap<String, DomainType>,
  total_size: u64,
  /// Highest occupancy since the last clear; every slot below it has been used.
  peak_len: usize,
  next_sequence: u64,
}

impl Registry {
  pub(crate) fn new() -> Self {
    Self {
      arena: Arena::new(),
      index: HashMap::new(),
      origin: HashMap::new(),
      total_size: 0,
      peak_len: 0,
      next_sequence: 0,
    }
  }

  /// Hands out the next admission sequence number.
  pub(crate) fn next_sequence(&mut self) -> u64 {
    let seq = self.next_sequence;
    self.next_sequence += 1;
    seq
  }

  /// Inserts or replaces an entry, returning the one it replaced.
  pub(crate) fn insert(&mut self, entry: CacheEntry, origin: DomainType) -> Option<CacheEntry> {
    self.origin.insert(entry.id.clone(), origin);
    self.total_size = self.total_size.saturating_add(entry.size);

    if let Some(&idx) = self.index.get(&entry.id) {
      if let Some(slot) = self.arena.get_mut(idx) {
        let previous = std::mem::replace(slot, entry);
        self.total_size = self.total_size.saturating_sub(previous.size);
        return Some(previous);
      }
    }

    let id = entry.id.clone();
    let idx = self.arena.insert(entry);
    self.index.insert(id, idx);
    self.peak_len = self.peak_len.max(self.arena.len());
    None
  }

  pub(crate) fn get(&self, id: &str) -> Option<&CacheEntry> {
    self.index.get(id).and_then(|&idx| self.arena.get(idx))
  }

  pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut CacheEntry> {
    let idx = *self.index.get(id)?;
    self.arena.get_mut(idx)
  }

  /// Collection the entry with `id` was loaded from.
  pub(crate) fn origin_of(&self, id: &str) -> Option<DomainType> {
    self.origin.get(id).copied()
  }

  pub(crate) fn remove(&mut self, id: &str) -> Option<(CacheEntry, DomainType)> {
    let idx = self.index.remove(id)?;
    let origin = self.origin.remove(id)?;
    let entry = self.arena.remove(idx)?;
    self.total_size = self.total_size.saturating_sub(entry.size);
    Some((entry, origin))
  }

  /// Drops every entry that was loaded from `origin`.
  pub(crate) fn remove_origin(&mut self, origin: DomainType) -> usize {
    let ids: Vec<String> = self
      .origin
      .iter()
      .filter(|(_, o)| **o == origin)
      .map(|(id, _)| id.clone())
      .collect();
    ids.iter().filter(|id| self.remove(id).is_some()).count()
  }

  /// Re-prices every entry for the given compression setting.
  pub(crate) fn apply_compression(&mut self, enabled: bool) {
    let mut total = 0u64;
    for (_, entry) in self.arena.iter_mut() {
      entry.apply_compression(enabled);
      total = total.saturating_add(entry.size);
    }
    self.total_size = total;
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
    self.arena.iter().map(|(_, entry)| entry)
  }

  pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CacheEntry> {
    self.arena.iter_mut().map(|(_, entry)| entry)
  }

  /// Owned copies of all entries, in admission order.
  pub(crate) fn snapshot(&self) -> Vec<CacheEntry> {
    let mut entries: Vec<CacheEntry> = self.iter().cloned().collect();
    entries.sort_by_key(|e| e.sequence);
    entries
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.arena.len()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  #[inline]
  pub(crate) fn total_size(&self) -> u64 {
    self.total_size
  }

  /// Share of previously occupied arena slots that are currently vacant.
  pub(crate) fn fragmentation(&self) -> f64 {
    if self.peak_len == 0 {
      return 0.0;
    }
    let vacant = self.peak_len.saturating_sub(self.arena.len());
    vacant as f64 / self.peak_len as f64
  }

  pub(crate) fn clear(&mut self) {
    self.arena.clear();
    self.index.clear();
    self.origin.clear();
    self.total_size = 0;
    self.peak_len = 0;
  }
}
