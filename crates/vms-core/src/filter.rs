//! Filtered views - read-only projections of an [`IdentityMap`].
//!
//! A view holds an ordered list of predicates and shows an entry iff every
//! predicate accepts it (an empty list accepts everything). Membership is
//! recomputed in full whenever the backing map's revision or the predicate
//! list changes; there is no incremental diffing.
//!
//! The cached membership is only an acceleration: a [`FilteredMap`] built
//! from a view that has not been synced since the last mutation evaluates
//! the predicates on the fly, so a reader can never observe stale
//! membership.

use crate::error::{Result, StoreError};
use crate::id_map::IdentityMap;
use crate::record::Filterable;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::sync::Arc;

/// A shareable test over a value.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A predicate that accepts everything.
pub fn show_all<T>() -> Predicate<T> {
    Arc::new(|_: &T| true)
}

/// The predicate set and cached membership of one projection.
pub struct FilteredView<K, V: Filterable> {
    predicates: Vec<Predicate<V::Target>>,
    members: Vec<K>,
    synced_revision: Option<u64>,
}

impl<K, V> FilteredView<K, V>
where
    K: Clone + Eq + Hash + Display,
    V: Clone + Filterable,
{
    /// A view that accepts every entry.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            members: Vec::new(),
            synced_revision: None,
        }
    }

    /// Replace the predicate set with a single predicate.
    pub fn set_filter(&mut self, predicate: Predicate<V::Target>) {
        self.predicates = vec![predicate];
        self.invalidate();
    }

    /// Replace the whole predicate set. An empty set shows everything.
    pub fn set_filters<I>(&mut self, predicates: I)
    where
        I: IntoIterator<Item = Predicate<V::Target>>,
    {
        self.predicates = predicates.into_iter().collect();
        self.invalidate();
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(Vec::new());
    }

    pub fn filter_count(&self) -> usize {
        self.predicates.len()
    }

    /// Force the next [`sync`](Self::sync) to recompute, e.g. after the
    /// backing map was swapped for a different instance.
    pub fn invalidate(&mut self) {
        self.synced_revision = None;
    }

    pub fn is_stale(&self, map: &IdentityMap<K, V>) -> bool {
        self.synced_revision != Some(map.revision())
    }

    pub fn accepts(&self, value: &V) -> bool {
        let target = value.target();
        self.predicates.iter().all(|p| p(target))
    }

    /// Recompute membership if the map or the predicates changed since the
    /// last sync. Returns whether a recomputation happened.
    pub fn sync(&mut self, map: &IdentityMap<K, V>) -> bool {
        if !self.is_stale(map) {
            return false;
        }
        self.members = map
            .iter()
            .filter(|(_, value)| self.accepts(value))
            .map(|(key, _)| key.clone())
            .collect();
        self.synced_revision = Some(map.revision());
        true
    }

    /// Read-only projection of `map` through this view.
    pub fn view<'a>(&'a self, map: &'a IdentityMap<K, V>) -> FilteredMap<'a, K, V> {
        FilteredMap { map, view: self }
    }
}

impl<K, V> Default for FilteredView<K, V>
where
    K: Clone + Eq + Hash + Display,
    V: Clone + Filterable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Filterable> Clone for FilteredView<K, V> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            members: self.members.clone(),
            synced_revision: self.synced_revision,
        }
    }
}

impl<K: fmt::Debug, V: Filterable> fmt::Debug for FilteredView<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredView")
            .field("predicates", &self.predicates.len())
            .field("members", &self.members)
            .field("synced_revision", &self.synced_revision)
            .finish()
    }
}

/// Borrowed read-only projection handed to readers.
pub struct FilteredMap<'a, K, V: Filterable> {
    map: &'a IdentityMap<K, V>,
    view: &'a FilteredView<K, V>,
}

impl<'a, K, V> FilteredMap<'a, K, V>
where
    K: Clone + Eq + Hash + Display,
    V: Clone + Filterable,
{
    /// Visible entries in backing-map order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a> {
        let map = self.map;
        let view = self.view;
        if view.is_stale(map) {
            Box::new(map.iter().filter(move |(_, value)| view.accepts(value)))
        } else {
            Box::new(
                view.members
                    .iter()
                    .filter_map(move |key| map.get_key_value(key)),
            )
        }
    }

    pub fn get(&self, key: &K) -> Option<&'a V> {
        let view = self.view;
        self.map.get(key).filter(|value| view.accepts(value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn to_vec(&self) -> Vec<V> {
        self.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Views are read-only; always fails with [`StoreError::Unsupported`].
    pub fn try_insert(&self, key: K, _value: V) -> Result<()> {
        Err(StoreError::Unsupported(format!(
            "cannot insert {} through a filtered view",
            key
        )))
    }

    /// Views are read-only; always fails with [`StoreError::Unsupported`].
    pub fn try_remove(&self, key: &K) -> Result<V> {
        Err(StoreError::Unsupported(format!(
            "cannot remove {} through a filtered view",
            key
        )))
    }
}
