//! Capacity-bounded, append-only store of feature vectors per key.
//!
//! Once a key is full, callers stop paying for extraction on its behalf:
//! [`FeatureCache::has_room`] is checked before the extractor runs.

use std::collections::BTreeMap;

use crate::types::FeatureRecord;

/// Per-key feature lists, each holding at most `capacity` records.
#[derive(Debug, Clone)]
pub struct FeatureCache<K: Ord> {
    capacity: usize,
    entries: BTreeMap<K, Vec<FeatureRecord>>,
}

impl<K: Ord> FeatureCache<K> {
    /// Create an empty cache.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeMap::new(),
        }
    }

    /// Maximum records per key.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Make `key` present with an empty list, so it shows up in the snapshot.
    pub fn ensure_key(&mut self, key: K) {
        self.entries.entry(key).or_default();
    }

    /// Number of records stored under `key`.
    pub fn len(&self, key: &K) -> usize {
        self.entries.get(key).map_or(0, Vec::len)
    }

    /// Whether `key` can take another record.
    pub fn has_room(&self, key: &K) -> bool {
        self.len(key) < self.capacity
    }

    /// Append a record if `key` has room; returns whether it was stored.
    pub fn push(&mut self, key: K, record: FeatureRecord) -> bool {
        let list = self.entries.entry(key).or_default();
        if list.len() >= self.capacity {
            return false;
        }
        list.push(record);
        true
    }

    /// Append a record produced by `extract` if `key` has room.
    ///
    /// `extract` is only called when the record will be stored.
    pub fn try_insert<E>(
        &mut self,
        key: K,
        extract: impl FnOnce() -> Result<FeatureRecord, E>,
    ) -> Result<bool, E> {
        if !self.has_room(&key) {
            return Ok(false);
        }
        let record = extract()?;
        Ok(self.push(key, record))
    }

    /// Records stored under `key`, in insertion order.
    pub fn get(&self, key: &K) -> &[FeatureRecord] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Consume the cache, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<K, Vec<FeatureRecord>> {
        self.entries
    }
}
