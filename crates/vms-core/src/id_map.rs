//! Identity maps - insertion-ordered stores keyed by a stable identity.
//!
//! [`IdentityMap`] is generic over the key type and knows nothing about how
//! keys come to exist. [`IdDataMap`] instantiates it with integer keys and
//! adds a strictly increasing allocator, so an identity handed out once is
//! never handed out again for the lifetime of the map.
//!
//! Every mutation bumps the map's revision. Filtered views compare that
//! revision with the one they were last computed at to know when to
//! recompute.

use crate::change::ValueChange;
use crate::error::{Result, StoreError};
use crate::record::{Id, IdData};
use indexmap::IndexMap;
use std::fmt::Display;
use std::hash::Hash;

/// An insertion-ordered map from identity to value.
#[derive(Clone, Debug)]
pub struct IdentityMap<K, V> {
    entries: IndexMap<K, V>,
    revision: u64,
}

impl<K, V> IdentityMap<K, V>
where
    K: Clone + Eq + Hash + Display,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            revision: 0,
        }
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.entries.get_key_value(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.values()
    }

    /// Insert a new entry; fails if the key is already mapped.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(StoreError::duplicate(&key));
        }
        self.entries.insert(key, value);
        self.touch();
        Ok(())
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.insert(key, value);
        self.touch();
        previous
    }

    /// Replace the value mapped to an existing key.
    pub fn set(&mut self, key: &K, value: V) -> Result<ValueChange<V>> {
        let slot = self
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        let old = std::mem::replace(slot, value.clone());
        self.touch();
        Ok(ValueChange::edited(old, value))
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &K) -> Result<V> {
        let old = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        self.touch();
        Ok(old)
    }

    /// Swap the whole collection. On a duplicate key the map is left as it was.
    pub fn replace_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fresh = IndexMap::new();
        for (key, value) in entries {
            if fresh.contains_key(&key) {
                return Err(StoreError::duplicate(&key));
            }
            fresh.insert(key, value);
        }
        self.swap(fresh);
        Ok(())
    }

    fn swap(&mut self, entries: IndexMap<K, V>) {
        self.entries = entries;
        self.touch();
    }
}

impl<K, V> Default for IdentityMap<K, V>
where
    K: Clone + Eq + Hash + Display,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for IdentityMap<K, V> {
    /// Same entries in the same order; revisions are bookkeeping and ignored.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a == b)
    }
}

/// An [`IdentityMap`] over integer identities with its own allocator.
#[derive(Clone, Debug)]
pub struct IdDataMap<T> {
    map: IdentityMap<Id, IdData<T>>,
    next_id: Id,
}

impl<T: Clone> IdDataMap<T> {
    pub fn new() -> Self {
        Self {
            map: IdentityMap::new(),
            next_id: 0,
        }
    }

    fn allocate(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn reserve(&mut self, id: Id) {
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
    }

    /// The identity the next [`add`](Self::add) will allocate.
    pub fn next_id(&self) -> Id {
        self.next_id
    }

    /// Move the allocator forward to at least `next`. Never moves it back.
    pub fn advance_to(&mut self, next: Id) {
        self.next_id = self.next_id.max(next);
    }

    pub fn revision(&self) -> u64 {
        self.map.revision()
    }

    pub fn as_map(&self) -> &IdentityMap<Id, IdData<T>> {
        &self.map
    }

    pub fn get(&self, id: Id) -> Option<&IdData<T>> {
        self.map.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.map.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdData<T>> + '_ {
        self.map.values()
    }

    /// Store `value` under a freshly allocated identity.
    pub fn add(&mut self, value: T) -> IdData<T> {
        let data = IdData::new(self.allocate(), value);
        self.map.upsert(data.id(), data.clone());
        data
    }

    /// Store a record under its own identity, replacing any value already
    /// there. The allocator is moved past the record's id.
    pub fn add_record(&mut self, record: IdData<T>) -> Option<IdData<T>> {
        self.reserve(record.id());
        self.map.upsert(record.id(), record)
    }

    pub fn set(&mut self, id: Id, value: T) -> Result<ValueChange<IdData<T>>> {
        self.map.set(&id, IdData::new(id, value))
    }

    pub fn remove(&mut self, id: Id) -> Result<IdData<T>> {
        self.map.remove(&id)
    }

    /// Replace the contents with `values`, giving each a fresh identity in
    /// iteration order. Fresh means never allocated before by this map.
    pub fn replace_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut fresh = IndexMap::new();
        for value in values {
            let id = self.allocate();
            fresh.insert(id, IdData::new(id, value));
        }
        self.map.swap(fresh);
    }

    /// Replace the contents with `records`, keeping their identities and
    /// order. Fails without touching the map if two records share an id.
    pub fn replace_records<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = IdData<T>>,
    {
        let records: Vec<IdData<T>> = records.into_iter().collect();
        let max_id = records.iter().map(IdData::id).max();
        self.map
            .replace_all(records.into_iter().map(|record| (record.id(), record)))?;
        if let Some(max_id) = max_id {
            self.reserve(max_id);
        }
        Ok(())
    }

    /// The whole collection in snapshot shape.
    pub fn records(&self) -> Vec<IdData<T>> {
        self.map.values().cloned().collect()
    }
}

impl<T: Clone> Default for IdDataMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for IdDataMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}
