//! Insertion-ordered set of node/edge handles
//!
//! Backs the label buckets, the property indexes and the adjacency lists.
//! Membership, insertion and removal are O(1); iteration follows insertion
//! order. Removal leaves a tombstone that is compacted away once tombstones
//! outnumber live entries.

use rustc_hash::FxHashMap;
use std::hash::Hash;

const COMPACT_THRESHOLD: usize = 32;

#[derive(Debug, Clone)]
pub struct IdentitySet<T> {
    entries: Vec<Option<T>>,
    positions: FxHashMap<T, usize>,
}

impl<T> IdentitySet<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: FxHashMap::default(),
        }
    }

    /// Adds `item`. Returns false (and leaves the order untouched) when it
    /// was already present.
    pub fn add(&mut self, item: T) -> bool {
        if self.positions.contains_key(&item) {
            return false;
        }
        self.positions.insert(item.clone(), self.entries.len());
        self.entries.push(Some(item));
        true
    }

    /// Removes `item`. Returns false when it was absent.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(pos) = self.positions.remove(item) else {
            return false;
        };
        self.entries[pos] = None;

        let tombstones = self.entries.len() - self.positions.len();
        if tombstones > COMPACT_THRESHOLD && tombstones > self.positions.len() {
            self.compact();
        }
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().flatten()
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (pos, entry) in self.entries.iter().enumerate() {
            if let Some(item) = entry {
                self.positions.insert(item.clone(), pos);
            }
        }
    }
}

impl<T> Default for IdentitySet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for IdentitySet<T>
where
    T: Clone + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = IdentitySet::new();
        for item in iter {
            set.add(item);
        }
        set
    }
}

impl<T> PartialEq for IdentitySet<T>
where
    T: Clone + Eq + Hash,
{
    /// Set equality; insertion order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl<T> Eq for IdentitySet<T> where T: Clone + Eq + Hash {}
