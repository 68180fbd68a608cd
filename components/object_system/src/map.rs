//! Backing tables for map and set values.
//!
//! Both store entries under derived [`HashKey`]s while keeping the
//! original key values, so iteration and rendering can hand scripts the
//! keys they inserted. Anything order-sensitive (rendering, `keys`,
//! iteration snapshots) goes through the sorted accessors for
//! determinism.

use std::collections::HashMap;

use crate::errors::RuntimeError;
use crate::hash::HashKey;
use crate::value::Value;

#[derive(Debug, Clone)]
struct MapEntry {
    key: Value,
    value: Value,
}

/// The table behind a map value.
#[derive(Debug, Clone, Default)]
pub struct MapValue {
    entries: HashMap<HashKey, MapEntry>,
}

impl MapValue {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace; returns the previous value. Fails if the key
    /// is unhashable.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>, RuntimeError> {
        let hash = key.hash_key()?;
        Ok(self.entries.insert(hash, MapEntry { key, value }).map(|e| e.value))
    }

    /// Look up by key value.
    pub fn get(&self, key: &Value) -> Result<Option<Value>, RuntimeError> {
        let hash = key.hash_key()?;
        Ok(self.entries.get(&hash).map(|e| e.value.clone()))
    }

    /// Remove by key value; returns the removed value.
    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, RuntimeError> {
        let hash = key.hash_key()?;
        Ok(self.entries.remove(&hash).map(|e| e.value))
    }

    /// Membership test.
    pub fn contains(&self, key: &Value) -> Result<bool, RuntimeError> {
        let hash = key.hash_key()?;
        Ok(self.entries.contains_key(&hash))
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy every entry of `other` into this map.
    pub fn extend_from(&mut self, other: &MapValue) {
        for entry in other.entries.values() {
            if let Ok(hash) = entry.key.hash_key() {
                self.entries.insert(hash, entry.clone());
            }
        }
    }

    /// Look up a value by derived key.
    pub fn get_by_hash(&self, hash: &HashKey) -> Option<&Value> {
        self.entries.get(hash).map(|e| &e.value)
    }

    /// Original key stored under a derived key.
    pub fn key_by_hash(&self, hash: &HashKey) -> Option<&Value> {
        self.entries.get(hash).map(|e| &e.key)
    }

    /// Iterate `(derived key, value)` pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&HashKey, &Value)> {
        self.entries.iter().map(|(hash, entry)| (hash, &entry.value))
    }

    /// `(key, value)` pairs sorted by derived key.
    pub fn sorted_entries(&self) -> Vec<(Value, Value)> {
        let mut pairs: Vec<(&HashKey, &MapEntry)> = self.entries.iter().collect();
        pairs.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        pairs.into_iter().map(|(_, e)| (e.key.clone(), e.value.clone())).collect()
    }

    /// Original keys sorted by derived key.
    pub fn sorted_keys(&self) -> Vec<Value> {
        self.sorted_entries().into_iter().map(|(k, _)| k).collect()
    }

    /// Derived keys sorted; the iteration snapshot.
    pub fn snapshot_keys(&self) -> Vec<HashKey> {
        let mut keys: Vec<HashKey> = self.entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}

/// The table behind a set value.
#[derive(Debug, Clone, Default)]
pub struct SetValue {
    items: HashMap<HashKey, Value>,
}

impl SetValue {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a member; true if it was not already present. Fails if the
    /// value is unhashable.
    pub fn add(&mut self, item: Value) -> Result<bool, RuntimeError> {
        let hash = item.hash_key()?;
        Ok(self.items.insert(hash, item).is_none())
    }

    /// Remove a member; true if it was present.
    pub fn remove(&mut self, item: &Value) -> Result<bool, RuntimeError> {
        let hash = item.hash_key()?;
        Ok(self.items.remove(&hash).is_some())
    }

    /// Membership test.
    pub fn contains(&self, item: &Value) -> Result<bool, RuntimeError> {
        let hash = item.hash_key()?;
        Ok(self.items.contains_key(&hash))
    }

    /// Membership test by derived key.
    pub fn contains_hash(&self, hash: &HashKey) -> bool {
        self.items.contains_key(hash)
    }

    /// Drop all members.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate derived keys in table order.
    pub fn hash_keys(&self) -> impl Iterator<Item = &HashKey> {
        self.items.keys()
    }

    /// Member under a derived key.
    pub fn item_by_hash(&self, hash: &HashKey) -> Option<&Value> {
        self.items.get(hash)
    }

    /// Members sorted by derived key.
    pub fn sorted_items(&self) -> Vec<Value> {
        let mut pairs: Vec<(&HashKey, &Value)> = self.items.iter().collect();
        pairs.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        pairs.into_iter().map(|(_, v)| v.clone()).collect()
    }

    /// Derived keys sorted; the iteration snapshot.
    pub fn snapshot_keys(&self) -> Vec<HashKey> {
        let mut keys: Vec<HashKey> = self.items.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Members present in either set.
    pub fn union(&self, other: &SetValue) -> SetValue {
        let mut items = self.items.clone();
        for (hash, value) in &other.items {
            items.entry(hash.clone()).or_insert_with(|| value.clone());
        }
        SetValue { items }
    }

    /// Members present in both sets.
    pub fn intersection(&self, other: &SetValue) -> SetValue {
        let items = self
            .items
            .iter()
            .filter(|(hash, _)| other.items.contains_key(*hash))
            .map(|(hash, value)| (hash.clone(), value.clone()))
            .collect();
        SetValue { items }
    }

    /// Members of this set absent from `other`.
    pub fn difference(&self, other: &SetValue) -> SetValue {
        let items = self
            .items
            .iter()
            .filter(|(hash, _)| !other.items.contains_key(*hash))
            .map(|(hash, value)| (hash.clone(), value.clone()))
            .collect();
        SetValue { items }
    }
}
