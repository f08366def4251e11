//! HashSet: the key-only form of [`HashTable`].

use crate::cursor::Cursor;
use crate::error::TableError;
use crate::hash_table::HashTable;
use crate::hashing::DefaultHashBuilder;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

#[derive(Clone)]
pub struct HashSet<K, S = DefaultHashBuilder> {
    table: HashTable<K, (), S>,
}

impl<K> HashSet<K>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }
}

impl<K> Default for HashSet<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> HashSet<K, S>
where
    K: Copy + Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: HashTable::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns `true` when `key` was not already a member.
    pub fn insert(&mut self, key: K) -> Result<bool, TableError> {
        self.table.set(key, ())
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.del(q).is_some()
    }

    /// Remove the member in physical slot `slot`, if any.
    pub fn remove_at(&mut self, slot: usize) -> Result<Option<K>, TableError> {
        Ok(self.table.del_at(slot)?.map(|(k, ())| k))
    }

    pub fn advance(&self, cursor: &mut Cursor) -> Option<(usize, &K)> {
        self.table.advance(cursor).map(|(slot, k, _)| (slot, k))
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.keys()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.table.reserve(additional)
    }
}
