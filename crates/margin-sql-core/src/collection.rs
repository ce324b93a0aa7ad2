//! Ordered collections returned by every query.
//!
//! `Collection` is a thin wrapper over `Vec` with the set of transforms the
//! relation loaders need: plucking keys, deduplicating them, grouping children
//! by foreign key and indexing related rows by primary key. Every operation is
//! total: an empty input yields an empty output.

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the collection holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Returns the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns the first item.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Consumes the collection, returning its first item.
    #[must_use]
    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    /// Iterates over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterates mutably over the items.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Borrows the items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Unwraps into the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Applies `f` to every item.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Collection<U> {
        self.items.into_iter().map(f).collect()
    }

    /// Keeps the items for which `f` returns true.
    #[must_use]
    pub fn filter<F: FnMut(&T) -> bool>(self, mut f: F) -> Self {
        self.items.into_iter().filter(|item| f(item)).collect()
    }

    /// Extracts one value per item.
    #[must_use]
    pub fn pluck<K, F: FnMut(&T) -> K>(&self, f: F) -> Collection<K> {
        self.items.iter().map(f).collect()
    }

    /// Drops items whose key was already seen; the first occurrence wins.
    #[must_use]
    pub fn unique_by<K: Eq + Hash, F: FnMut(&T) -> K>(self, mut f: F) -> Self {
        let mut seen = HashSet::new();
        self.items
            .into_iter()
            .filter(|item| seen.insert(f(item)))
            .collect()
    }

    /// Groups items by key. Groups appear in first-seen order and each group
    /// keeps the relative order of its items.
    #[must_use]
    pub fn group_by<K: Eq + Hash, F: FnMut(&T) -> K>(
        self,
        mut f: F,
    ) -> KeyedCollection<K, Collection<T>> {
        let mut groups: IndexMap<K, Collection<T>> = IndexMap::new();
        for item in self.items {
            groups.entry(f(&item)).or_default().push(item);
        }
        KeyedCollection { entries: groups }
    }

    /// Indexes items by key. On duplicate keys the last item wins.
    #[must_use]
    pub fn key_by<K: Eq + Hash, F: FnMut(&T) -> K>(self, mut f: F) -> KeyedCollection<K, T> {
        let mut entries = IndexMap::new();
        for item in self.items {
            entries.insert(f(&item), item);
        }
        KeyedCollection { entries }
    }

    /// Appends all items of `other`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.items.extend(other.items);
        self
    }

    /// Returns the items re-indexed from zero.
    #[must_use]
    pub fn values(self) -> Self {
        self
    }
}

impl<T: Eq + Hash + Clone> Collection<T> {
    /// Removes duplicate items; the first occurrence wins.
    #[must_use]
    pub fn unique(self) -> Self {
        self.unique_by(Clone::clone)
    }
}

impl<T: PartialEq> Collection<T> {
    /// Returns the items not present in `other`.
    #[must_use]
    pub fn diff(self, other: &Self) -> Self {
        self.filter(|item| !other.items.contains(item))
    }

    /// Returns whether an equal item is present.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

impl<T: Display> Collection<T> {
    /// Joins the items' display forms with `separator`.
    #[must_use]
    pub fn implode(&self, separator: &str) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(&item.to_string());
        }
        out
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A mapping-shaped collection produced by `group_by` and `key_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedCollection<K: Eq + Hash, V> {
    entries: IndexMap<K, V>,
}

impl<K: Eq + Hash, V> Default for KeyedCollection<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> KeyedCollection<K, V> {
    /// Returns the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns a copy of the entry for `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &K, default: V) -> V
    where
        V: Clone,
    {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    /// Takes the entry for `key` out of the mapping.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Collection<K>
    where
        K: Clone,
    {
        self.entries.keys().cloned().collect()
    }

    /// Discards the keys, returning the entries in insertion order.
    #[must_use]
    pub fn values(self) -> Collection<V> {
        self.entries.into_values().collect()
    }

    /// Iterates over `(key, entry)` pairs.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }
}

impl<K: Eq + Hash, V> IntoIterator for KeyedCollection<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T: fmt::Display> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.implode(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        parent_id: i64,
    }

    fn items() -> Collection<Item> {
        Collection::from(vec![
            Item { id: 1, parent_id: 0 },
            Item { id: 2, parent_id: 0 },
            Item { id: 3, parent_id: 1 },
        ])
    }

    #[test]
    fn test_pluck_and_unique() {
        let parents = items().pluck(|i| i.parent_id).unique();
        assert_eq!(parents.into_vec(), vec![0, 1]);
    }

    #[test]
    fn test_group_by_keeps_order_within_groups() {
        let grouped = items().group_by(|i| i.parent_id);
        assert_eq!(grouped.keys().into_vec(), vec![0, 1]);
        let roots = grouped.get(&0).expect("group exists");
        assert_eq!(roots.pluck(|i| i.id).into_vec(), vec![1, 2]);
        assert!(grouped.get_or(&9, Collection::new()).is_empty());
    }

    #[test]
    fn test_key_by_last_wins() {
        let keyed = items().key_by(|i| i.parent_id);
        assert_eq!(keyed.len(), 2);
        assert_eq!(keyed.get(&0).map(|i| i.id), Some(2));
    }

    #[test]
    fn test_unique_by_first_wins() {
        let firsts = items().unique_by(|i| i.parent_id);
        assert_eq!(firsts.pluck(|i| i.id).into_vec(), vec![1, 3]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty: Collection<Item> = Collection::new();
        assert!(empty.pluck(|i| i.id).is_empty());
        assert!(empty.clone().group_by(|i| i.id).is_empty());
        assert!(empty.clone().key_by(|i| i.id).is_empty());
        assert_eq!(empty.pluck(|i| i.id).implode(","), "");
    }

    #[test]
    fn test_diff_merge_implode() {
        let existing = Collection::from(vec![1_i64, 2]);
        let target = Collection::from(vec![2_i64, 3]);
        assert_eq!(existing.clone().diff(&target).into_vec(), vec![1]);
        assert_eq!(target.clone().diff(&existing).into_vec(), vec![3]);
        assert_eq!(existing.merge(target).implode(", "), "1, 2, 2, 3");
    }

    #[test]
    fn test_filter_map() {
        let ids = items()
            .filter(|i| i.parent_id == 0)
            .map(|i| i.id * 10)
            .into_vec();
        assert_eq!(ids, vec![10, 20]);
    }
}
