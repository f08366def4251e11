//! HashTable: open addressing with linear probing and tombstone deletion.
//!
//! Layout
//! - One power-of-two array of slots, each Empty, Tombstone or Occupied.
//!   An Occupied slot stores the key, the value and the key's 64-bit hash.
//! - A key lives in the first usable slot along its probe sequence, which
//!   starts at `hash & (capacity - 1)` and walks forward with wraparound.
//!
//! Probing
//! - Lookups skip Tombstones and stop at the first Empty slot or after one
//!   full lap. Stored hashes are compared before keys.
//! - Insertion remembers the first Empty-or-Tombstone slot seen and writes
//!   there when the key is absent.
//!
//! Growth
//! - Before each `set`, the table grows to the next power of two if one more
//!   entry would push `count` past 2/3 of the capacity. Growth rehashes every
//!   Occupied slot from its stored hash (the user hasher is never called
//!   again) and drops Tombstones.
//! - If `count` fits but `count + tombstones` would not, the tombstones are
//!   purged. The purge rehashes at the same capacity while `count + 1` fits
//!   in half the slots, and grows otherwise, so every full rehash is paid
//!   for by a sixth of the capacity in fresh inserts. Capacity only shrinks
//!   via `resize`.
//! - Storage is allocated fallibly. A capacity past the ceiling or an
//!   allocation the system refuses leaves the table as it was and returns
//!   `TableError::CapacityOverflow`.
//!
//! Deletion marks a slot Tombstone and moves nothing, so `del_at` on the
//! slot a cursor just yielded is safe mid-walk.

use crate::cursor::Cursor;
use crate::error::TableError;
use crate::growth::{self, MAX_HASH_CAPACITY};
use crate::hashing::DefaultHashBuilder;
use crate::reentrancy::ProbeGuard;
use crate::trap;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

/// Observable state of a slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mark {
    Empty,
    Tombstone,
    Occupied,
}

#[derive(Copy, Clone, Debug)]
struct Bucket<K, V> {
    hash: u64,
    key: K,
    value: V,
}

#[derive(Copy, Clone, Debug)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied(Bucket<K, V>),
}

impl<K, V> Slot<K, V> {
    fn mark(&self) -> Mark {
        match self {
            Slot::Empty => Mark::Empty,
            Slot::Tombstone => Mark::Tombstone,
            Slot::Occupied(_) => Mark::Occupied,
        }
    }

    fn bucket(&self) -> Option<&Bucket<K, V>> {
        match self {
            Slot::Occupied(b) => Some(b),
            _ => None,
        }
    }

    fn bucket_mut(&mut self) -> Option<&mut Bucket<K, V>> {
        match self {
            Slot::Occupied(b) => Some(b),
            _ => None,
        }
    }
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

/// Map from plain-data keys to plain-data values.
#[derive(Clone)]
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    slots: Box<[Slot<K, V>]>,
    count: usize,
    tombstones: usize,
    guard: ProbeGuard,
}

impl<K, V> HashTable<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty table already sized to take `count` entries without growing.
    /// A reservation that cannot be met is reported and the table starts
    /// unallocated.
    pub fn with_capacity(count: usize) -> Self {
        let mut t = Self::new();
        let _ = t.reserve(count);
        t
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Copy + Eq + Hash,
    V: Copy,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            slots: Box::default(),
            count: 0,
            tombstones: 0,
            guard: ProbeGuard::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of Occupied slots.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots; always zero or a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    // Callers hold the probe guard: this runs user `Eq`.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Probe::Full;
        }
        let mask = capacity - 1;
        let start = hash as usize & mask;
        let mut reusable = None;

        for step in 0..capacity {
            let i = (start + step) & mask;
            match &self.slots[i] {
                Slot::Empty => return Probe::Vacant(reusable.unwrap_or(i)),
                Slot::Tombstone => {
                    reusable.get_or_insert(i);
                }
                Slot::Occupied(b) => {
                    if b.hash == hash && b.key.borrow() == q {
                        return Probe::Found(i);
                    }
                }
            }
        }
        reusable.map_or(Probe::Full, Probe::Vacant)
    }

    fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.count == 0 {
            return None;
        }
        let _g = self.guard.enter();
        let hash = self.make_hash(q);
        match self.probe(hash, q) {
            Probe::Found(i) => Some(i),
            _ => None,
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        self.slots[i].bucket().map(|b| &b.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        self.slots[i].bucket_mut().map(|b| &mut b.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        self.slots[i].bucket().map(|b| (&b.key, &b.value))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_index(q).is_some()
    }

    /// Insert or overwrite. Returns `true` when `key` was not present.
    ///
    /// Fails when the table cannot grow to take one more entry: it is at its
    /// maximum capacity, or the larger slot array could not be allocated.
    pub fn set(&mut self, key: K, value: V) -> Result<bool, TableError> {
        self.make_room()?;

        let _g = self.guard.enter();
        let hash = self.make_hash(&key);
        match self.probe(hash, &key) {
            Probe::Found(i) => {
                self.slots[i] = Slot::Occupied(Bucket { hash, key, value });
                Ok(false)
            }
            Probe::Vacant(i) => {
                if self.slots[i].mark() == Mark::Tombstone {
                    self.tombstones -= 1;
                }
                self.slots[i] = Slot::Occupied(Bucket { hash, key, value });
                self.count += 1;
                Ok(true)
            }
            Probe::Full => Err(trap::raise(TableError::CapacityOverflow {
                requested: self.count.saturating_add(1),
                max: MAX_HASH_CAPACITY,
            })),
        }
    }

    /// Remove `q`, returning its value if it was present.
    pub fn del<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        self.vacate(i).map(|(_, v)| v)
    }

    /// Remove whatever occupies physical slot `slot`.
    ///
    /// `Ok(None)` when the slot is in range but not Occupied. Other slots
    /// never move, so this is safe on the slot a cursor just yielded.
    pub fn del_at(&mut self, slot: usize) -> Result<Option<(K, V)>, TableError> {
        if slot >= self.slots.len() {
            return Err(trap::raise(TableError::OutOfRange {
                index: slot,
                len: self.slots.len(),
            }));
        }
        Ok(self.vacate(slot))
    }

    fn vacate(&mut self, i: usize) -> Option<(K, V)> {
        let b = *self.slots[i].bucket()?;
        self.slots[i] = Slot::Tombstone;
        self.count -= 1;
        self.tombstones += 1;
        Some((b.key, b.value))
    }

    pub fn key_at(&self, slot: usize) -> Option<&K> {
        self.slots.get(slot)?.bucket().map(|b| &b.key)
    }

    pub fn value_at(&self, slot: usize) -> Option<&V> {
        self.slots.get(slot)?.bucket().map(|b| &b.value)
    }

    pub fn mark_at(&self, slot: usize) -> Option<Mark> {
        self.slots.get(slot).map(Slot::mark)
    }

    /// Yield the next Occupied slot at or after the cursor, in storage order.
    ///
    /// Between steps the only mutation allowed is `del_at` on the slot just
    /// yielded; anything that can grow the table invalidates the walk.
    pub fn advance(&self, cursor: &mut Cursor) -> Option<(usize, &K, &V)> {
        while cursor.next < self.slots.len() {
            let i = cursor.next;
            if let Some(b) = self.slots[i].bucket() {
                cursor.visit(i);
                return Some((i, &b.key, &b.value));
            }
            cursor.next += 1;
        }
        cursor.finish(self.slots.len());
        None
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.count,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.count,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Keep only the entries for which `keep` returns `true`; returns how
    /// many were removed. A sweep with `del_at` under the hood.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        for i in 0..self.slots.len() {
            let evict = match self.slots[i].bucket_mut() {
                Some(b) => !keep(&b.key, &mut b.value),
                None => false,
            };
            if evict {
                self.vacate(i);
                removed += 1;
            }
        }
        removed
    }

    /// Forget every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.fill(Slot::Empty);
        self.count = 0;
        self.tombstones = 0;
    }

    /// Forget every entry and release the storage.
    pub fn reset(&mut self) {
        self.slots = Box::default();
        self.count = 0;
        self.tombstones = 0;
    }

    /// Make room for `additional` more entries without further growth.
    ///
    /// A request past [`MAX_HASH_CAPACITY`] or a refused allocation leaves
    /// the table unchanged.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let requested = self.count.saturating_add(additional);
        let grown = growth::hash_capacity_for(requested);
        if grown.clamped {
            return Err(trap::raise(TableError::CapacityOverflow {
                requested,
                max: MAX_HASH_CAPACITY,
            }));
        }
        if grown.capacity > self.slots.len() {
            self.rebuild(grown.capacity)?;
        }
        Ok(())
    }

    /// Rehash into exactly `target` slots, rounded up to a power of two.
    ///
    /// A target too small for the current entries is raised to the smallest
    /// capacity that holds them. `resize(0)` on an empty table releases the
    /// storage.
    pub fn resize(&mut self, target: usize) -> Result<(), TableError> {
        if target == 0 && self.count == 0 {
            self.reset();
            return Ok(());
        }
        let grown = growth::round_hash_capacity(target);
        if grown.clamped {
            return Err(trap::raise(TableError::CapacityOverflow {
                requested: target,
                max: MAX_HASH_CAPACITY,
            }));
        }
        let needed = growth::hash_capacity_for(self.count).capacity;
        let capacity = if grown.capacity < needed {
            log::warn!(
                "hash table resize to {} raised to {} to hold {} entries",
                target,
                needed,
                self.count
            );
            needed
        } else {
            grown.capacity
        };
        self.rebuild(capacity)
    }

    fn make_room(&mut self) -> Result<(), TableError> {
        let capacity = self.slots.len();
        if !growth::should_grow(capacity, self.count + self.tombstones) {
            return Ok(());
        }
        if self.tombstones > 0 && growth::rehash_in_place(capacity, self.count) {
            return self.rebuild(capacity);
        }

        let requested = self.count + 1;
        let mut target = growth::hash_capacity_for(requested).capacity;
        if target <= capacity {
            // Only tombstones are in the way, but too many live entries for
            // an in-place purge to last: double instead.
            target = growth::round_hash_capacity(capacity.saturating_mul(2)).capacity;
        }
        if target > capacity {
            return self.rebuild(target);
        }
        if self.tombstones > 0 {
            // At the ceiling; purging is all that is left.
            return self.rebuild(capacity);
        }
        Err(trap::raise(TableError::CapacityOverflow {
            requested,
            max: MAX_HASH_CAPACITY,
        }))
    }

    // Moves Occupied slots by stored hash; never calls user code. On a
    // refused allocation the table is left untouched.
    fn rebuild(&mut self, capacity: usize) -> Result<(), TableError> {
        debug_assert!(capacity.is_power_of_two());
        let mut fresh = Vec::new();
        if fresh.try_reserve_exact(capacity).is_err() {
            return Err(trap::raise(TableError::CapacityOverflow {
                requested: capacity,
                max: MAX_HASH_CAPACITY,
            }));
        }
        fresh.resize(capacity, Slot::Empty);
        let old = core::mem::replace(&mut self.slots, fresh.into_boxed_slice());
        let mask = capacity - 1;
        for b in old.iter().filter_map(Slot::bucket) {
            let mut i = b.hash as usize & mask;
            while self.slots[i].mark() != Mark::Empty {
                i = (i + 1) & mask;
            }
            self.slots[i] = Slot::Occupied(*b);
        }
        log::trace!(
            "hash table rehashed {} entries: capacity {} -> {}, {} tombstones dropped",
            self.count,
            old.len(),
            capacity,
            self.tombstones
        );
        self.tombstones = 0;
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S>
where
    K: Copy + Eq + Hash + fmt::Debug,
    V: Copy + fmt::Debug,
    S: BuildHasher + Clone + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over entries of a [`HashTable`], in storage order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let b = self.slots.by_ref().find_map(Slot::bucket)?;
        self.remaining -= 1;
        Some((&b.key, &b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over entries of a [`HashTable`] with mutable values.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let b = self.slots.by_ref().find_map(Slot::bucket_mut)?;
        self.remaining -= 1;
        Some((&b.key, &mut b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S>
where
    K: Copy + Eq + Hash,
    V: Copy,
    S: BuildHasher + Clone + Default,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::PreHashed;
    use std::collections::BTreeMap;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key starts probing at slot 0
    }

    fn contents<K, V, S>(t: &HashTable<K, V, S>) -> BTreeMap<K, V>
    where
        K: Copy + Eq + Hash + Ord,
        V: Copy,
        S: BuildHasher + Clone + Default,
    {
        t.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Invariant: a fresh table owns no storage; the first `set` allocates.
    #[test]
    fn starts_with_zero_capacity() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        assert_eq!(t.capacity(), 0);
        assert!(t.is_empty());
        assert_eq!(t.get(&1), None);
        assert_eq!(t.del(&1), None);
        assert!(t.set(1, 10).unwrap());
        assert_eq!(t.capacity(), growth::MIN_CAPACITY);
    }

    /// Invariant: `set` reports newness; overwriting keeps `len` and returns the
    /// latest value.
    #[test]
    fn set_overwrites_existing_key() {
        let mut t: HashTable<u32, &str> = HashTable::new();
        assert!(t.set(7, "a").unwrap());
        assert!(!t.set(7, "b").unwrap());
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&7), Some(&"b"));
    }

    /// Invariant: borrowed lookup works (store `&'static str`, query with `str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: HashTable<&'static str, i32> = HashTable::new();
        t.set("hello", 1).unwrap();
        assert!(t.contains_key("hello"));
        assert!(!t.contains_key("world"));
        assert_eq!(t.get_key_value("hello"), Some((&"hello", &1)));
    }

    /// Invariant: deleting one key leaves every other key intact.
    #[test]
    fn delete_is_local() {
        let mut t: HashTable<u64, u64> = HashTable::new();
        for k in 0..100 {
            t.set(k, k * 3).unwrap();
        }
        assert_eq!(t.del(&40), Some(120));
        assert_eq!(t.del(&40), None);
        assert_eq!(t.get(&40), None);
        for k in (0..100).filter(|k| *k != 40) {
            assert_eq!(t.get(&k), Some(&(k * 3)));
        }
        assert_eq!(t.len(), 99);
    }

    /// Invariant: growth keeps the exact entry set and count, and capacity is a
    /// power of two that respects the 2/3 load factor.
    #[test]
    fn growth_preserves_contents() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        let mut last_cap = 0;
        for k in 0..1_000u32 {
            let before = contents(&t);
            let len = t.len();
            t.set(k, !k).unwrap();
            if t.capacity() != last_cap {
                let mut after = contents(&t);
                after.remove(&k);
                assert_eq!(before, after);
                assert_eq!(t.len(), len + 1);
                last_cap = t.capacity();
            }
            assert!(t.capacity().is_power_of_two());
            assert!(t.len() * 3 <= t.capacity() * 2);
        }
    }

    /// Invariant: lookups survive full collision chains; equality picks the entry.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut t: HashTable<u32, u32, ConstBuildHasher> = HashTable::with_hasher(ConstBuildHasher);
        for k in 0..20 {
            t.set(k, k + 100).unwrap();
        }
        for k in 0..20 {
            assert_eq!(t.get(&k), Some(&(k + 100)));
        }
        // Deleting from the middle of the chain must not cut it.
        t.del(&3).unwrap();
        t.del(&10).unwrap();
        for k in (0..20).filter(|k| *k != 3 && *k != 10) {
            assert_eq!(t.get(&k), Some(&(k + 100)));
        }
        assert_eq!(t.get(&3), None);
    }

    /// Invariant: a Tombstone on the probe path is reused for the next insert
    /// of an absent key, and does not hide keys placed after it.
    #[test]
    fn tombstones_are_reused() {
        let mut t: HashTable<u32, u32, ConstBuildHasher> = HashTable::with_hasher(ConstBuildHasher);
        t.set(1, 1).unwrap();
        t.set(2, 2).unwrap();
        t.set(3, 3).unwrap();
        assert_eq!(t.mark_at(0), Some(Mark::Occupied));
        t.del(&1).unwrap();
        assert_eq!(t.mark_at(0), Some(Mark::Tombstone));
        assert_eq!(t.get(&3), Some(&3));

        assert!(t.set(4, 4).unwrap());
        assert_eq!(t.key_at(0), Some(&4));
        assert_eq!(t.mark_at(0), Some(Mark::Occupied));
        assert_eq!(t.len(), 3);
    }

    /// Invariant: re-setting a key that sits past a Tombstone updates it in place
    /// rather than creating a duplicate in the Tombstone.
    #[test]
    fn no_duplicate_after_tombstone() {
        let mut t: HashTable<u32, u32, ConstBuildHasher> = HashTable::with_hasher(ConstBuildHasher);
        t.set(1, 1).unwrap();
        t.set(2, 2).unwrap();
        t.del(&1).unwrap();
        assert!(!t.set(2, 20).unwrap());
        assert_eq!(t.len(), 1);
        assert_eq!(t.iter().count(), 1);
        assert_eq!(t.get(&2), Some(&20));
    }

    /// Invariant: delete/insert churn at a steady size that fits in half the
    /// slots rehashes in place instead of growing, and probes keep terminating.
    #[test]
    fn churn_does_not_grow() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for k in 0..3 {
            t.set(k, k).unwrap();
        }
        assert_eq!(t.capacity(), 8);
        for k in 3..2_000 {
            assert_eq!(t.del(&(k - 3)), Some(k - 3));
            assert!(t.set(k, k).unwrap());
            assert_eq!(t.capacity(), 8);
            assert_eq!(t.len(), 3);
            assert_eq!(t.get(&(k - 3)), None);
        }
    }

    /// Invariant: churn with the table filled to its load limit purges
    /// tombstones in batches. Each full rehash is followed by many cheap
    /// inserts, and the table grows at most once.
    #[test]
    fn churn_at_load_limit_rehashes_rarely() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        // 42 is the most that 64 slots hold at a 2/3 load factor.
        for k in 0..42 {
            t.set(k, k).unwrap();
        }
        assert_eq!(t.capacity(), 64);

        let churns = 4_000u32;
        let mut rehashes = 0;
        for k in 42..42 + churns {
            t.del(&(k - 42)).unwrap();
            let tombstones = t.tombstones;
            let capacity = t.capacity();
            assert!(t.set(k, k).unwrap());
            // An insert consumes at most one tombstone; more means a rehash.
            if t.capacity() != capacity || (tombstones >= 2 && t.tombstones == 0) {
                rehashes += 1;
            }
            assert_eq!(t.len(), 42);
            assert!((t.len() + t.tombstones) * 3 <= t.capacity() * 2);
        }
        assert_eq!(t.capacity(), 128);
        assert!(rehashes > 0);
        assert!(
            rehashes <= churns / 16,
            "{rehashes} rehashes for {churns} churns"
        );
        for k in churns..42 + churns {
            assert_eq!(t.get(&k), Some(&k));
        }
    }

    /// Invariant: the cursor walk visits every entry once, and `del_at` on the
    /// current slot is safe mid-walk.
    #[test]
    fn cursor_walk_with_del_at() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for k in 0..50 {
            t.set(k, k).unwrap();
        }
        let mut cursor = Cursor::new();
        let mut seen = 0;
        while let Some((slot, _k, v)) = t.advance(&mut cursor) {
            seen += 1;
            assert_eq!(cursor.current(), Some(slot));
            let odd = *v % 2 == 1;
            if odd {
                let (k, _) = t.del_at(slot).unwrap().unwrap();
                assert_eq!(k % 2, 1);
            }
        }
        assert_eq!(seen, 50);
        assert_eq!(cursor.current(), None);
        assert_eq!(t.len(), 25);
        assert!(t.keys().all(|k| k % 2 == 0));
    }

    /// Invariant: `del_at` declines out-of-range and non-Occupied slots.
    #[test]
    fn del_at_bounds() {
        let mut t: HashTable<u32, u32, PreHashed> = HashTable::with_hasher(PreHashed);
        t.set(1, 1).unwrap();
        assert_eq!(t.del_at(0).unwrap(), None);
        assert_eq!(t.del_at(1).unwrap(), Some((1, 1)));
        assert_eq!(t.del_at(1).unwrap(), None);
        if !trap::enabled() {
            assert_eq!(
                t.del_at(8),
                Err(TableError::OutOfRange { index: 8, len: 8 })
            );
        }
    }

    /// Invariant: `retain` evicts exactly the rejected entries and may update
    /// the kept ones.
    #[test]
    fn retain_sweeps() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for k in 0..30 {
            t.set(k, 3).unwrap();
        }
        if let Some(v) = t.get_mut(&5) {
            *v = 1;
        }
        for expected in [1, 0] {
            let removed = t.retain(|_, uses| {
                *uses -= 1;
                *uses > 0
            });
            assert_eq!(removed, expected);
        }
        assert!(!t.contains_key(&5));
        assert_eq!(t.len(), 29);
        assert!(t.iter().all(|(_, v)| *v == 1));
    }

    /// Invariant: `iter_mut` updates are visible to later lookups; iterators are
    /// exact-size.
    #[test]
    fn iteration_and_mutation() {
        let mut t: HashTable<u8, i32> = HashTable::new();
        for k in 0..10u8 {
            t.set(k, k as i32).unwrap();
        }
        assert_eq!(t.iter().len(), 10);
        for (_, v) in t.iter_mut() {
            *v += 10;
        }
        for k in 0..10u8 {
            assert_eq!(t.get(&k), Some(&(k as i32 + 10)));
        }
    }

    /// Invariant: `clear` keeps capacity, `reset` releases it.
    #[test]
    fn clear_and_reset() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(100);
        let cap = t.capacity();
        assert!(cap >= 150);
        for k in 0..100 {
            t.set(k, k).unwrap();
        }
        assert_eq!(t.capacity(), cap);
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), cap);
        assert_eq!(t.get(&3), None);
        t.reset();
        assert_eq!(t.capacity(), 0);
        assert!(t.set(3, 3).unwrap());
    }

    /// Invariant: explicit resize never drops entries; a too-small target is
    /// raised to what the entries need.
    #[test]
    fn resize_respects_count() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for k in 0..40 {
            t.set(k, k).unwrap();
        }
        let before = contents(&t);
        t.resize(4).unwrap();
        assert_eq!(t.capacity(), 64);
        assert_eq!(contents(&t), before);
        t.resize(1_000).unwrap();
        assert_eq!(t.capacity(), 1_024);
        assert_eq!(contents(&t), before);

        let mut e: HashTable<u32, u32> = HashTable::new();
        e.resize(20).unwrap();
        assert_eq!(e.capacity(), 32);
        e.resize(0).unwrap();
        assert_eq!(e.capacity(), 0);
    }

    /// Invariant: requests past the slot ceiling are declined without
    /// allocating, and the table keeps working.
    #[test]
    fn oversized_requests_leave_table_unchanged() {
        if trap::enabled() {
            return;
        }
        let mut t: HashTable<u32, u32> = HashTable::new();
        for k in 0..10 {
            t.set(k, k).unwrap();
        }
        let cap = t.capacity();
        let before = contents(&t);
        assert_eq!(
            t.reserve(usize::MAX),
            Err(TableError::CapacityOverflow {
                requested: usize::MAX,
                max: MAX_HASH_CAPACITY
            })
        );
        assert!(t.resize(MAX_HASH_CAPACITY + 1).is_err());
        assert_eq!(t.capacity(), cap);
        assert_eq!(contents(&t), before);
        assert!(t.set(10, 10).unwrap());

        let empty: HashTable<u32, u32> = HashTable::with_capacity(usize::MAX);
        assert_eq!(empty.capacity(), 0);
    }

    /// Invariant: a slot array the allocator refuses is reported as
    /// `CapacityOverflow` and the old slots stay in place.
    #[test]
    fn refused_allocation_leaves_table_unchanged() {
        if trap::enabled() {
            return;
        }
        // Half a MiB per key: 2^30 entries need far more than any address space.
        type Huge = [u64; 1 << 16];
        let mut t: HashTable<Huge, u8> = HashTable::new();
        assert_eq!(
            t.reserve(1 << 30),
            Err(TableError::CapacityOverflow {
                requested: MAX_HASH_CAPACITY,
                max: MAX_HASH_CAPACITY
            })
        );
        assert_eq!(t.capacity(), 0);
        assert!(t.is_empty());
    }

    /// Invariant (debug-only): re-entering the table from `K: Eq` during a probe
    /// panics due to the probe guard; in release builds this test is skipped.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_get() {
        #[derive(Copy, Clone)]
        struct ReentryKey {
            id: &'static str,
            table: *const HashTable<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    // Attempt to re-enter the same table during probing.
                    unsafe {
                        let t = &*other.table;
                        let _ = t.contains_key(self);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut t: HashTable<ReentryKey, i32, ConstBuildHasher> =
            HashTable::with_hasher(ConstBuildHasher);
        let table = &t as *const _;
        t.set(
            ReentryKey {
                id: "a",
                table,
                trigger: false,
            },
            1,
        )
        .unwrap();

        let query = ReentryKey {
            id: "b",
            table,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.get(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
