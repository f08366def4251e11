//! HandleTable: generational slot map over packed plain-data values.
//!
//! Storage
//! - `dense`: live values, packed, in compaction order.
//! - `dense_to_sparse`: for each dense position, the sparse slot that owns it.
//! - `sparse`: one entry per slot ever issued. A live entry's `link` is its
//!   dense position; a free entry's `link` is the next free slot. A slot
//!   that was never used links to `index + 1`, so the free list runs off the
//!   end of `sparse` into slots that do not exist yet.
//!
//! A handle `(id, generation)` resolves when `sparse[id - 1]` carries the
//! same generation and the dense back-pointer at its `link` names `id - 1`.
//! Both directions are checked, so a forged or recycled handle never
//! resolves to a foreign value.
//!
//! `discard` swap-removes: the last dense value moves into the hole and its
//! sparse link is rewritten. The move is returned to the caller as
//! [`Moved`] so position-keyed caches can follow it.

use crate::cursor::Cursor;
use crate::dyn_array::DynArray;
use crate::error::TableError;
use crate::growth::MAX_CAPACITY;
use crate::handle::Handle;
use crate::trap;
use core::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct SparseEntry {
    link: u32,
    generation: u32,
}

/// A value relocated by swap-compaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Moved {
    pub handle: Handle,
    pub from: usize,
    pub to: usize,
}

/// Outcome of a successful [`HandleTable::discard`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Discarded<T> {
    pub value: T,
    /// The other handle whose dense position changed, if any.
    pub moved: Option<Moved>,
}

#[derive(Clone)]
pub struct HandleTable<T> {
    dense: DynArray<T>,
    dense_to_sparse: DynArray<u32>,
    sparse: DynArray<SparseEntry>,
    free_head: u32,
}

impl<T: Copy> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            dense: DynArray::new(),
            dense_to_sparse: DynArray::new(),
            sparse: DynArray::new(),
            free_head: 0,
        }
    }

    /// A reservation that cannot be met is reported and the table starts
    /// unallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut t = Self::new();
        let _ = t.reserve(capacity);
        t
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Make room for `additional` more values without reallocating. On
    /// failure the table is unchanged apart from any arrays already grown.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let target = self.dense.len().saturating_add(additional);
        self.dense.ensure(target)?;
        self.dense_to_sparse.ensure(target)?;
        self.sparse.ensure(target)
    }

    /// Store `value` and return a fresh handle for it.
    ///
    /// Recycles the most recently freed slot first. Fails only when every
    /// representable id is live.
    pub fn acquire(&mut self, value: T) -> Result<Handle, TableError> {
        let index = self.free_head as usize;
        if index == self.sparse.len() {
            if index >= MAX_CAPACITY {
                return Err(trap::raise(TableError::CapacityOverflow {
                    requested: index + 1,
                    max: MAX_CAPACITY,
                }));
            }
            self.sparse.push(SparseEntry {
                link: index as u32 + 1,
                generation: 0,
            })?;
        }
        // Both pushes below must succeed once the free list is unlinked.
        let needed = self.dense.len() + 1;
        self.dense.ensure(needed)?;
        self.dense_to_sparse.ensure(needed)?;

        let position = self.dense.len() as u32;
        let entry = &mut self.sparse.as_mut_slice()[index];
        self.free_head = entry.link;
        entry.link = position;
        let generation = entry.generation;

        self.dense.push(value)?;
        self.dense_to_sparse.push(index as u32)?;
        Ok(Handle::new(index as u32, generation))
    }

    /// Dense position of a live handle.
    fn locate(&self, handle: Handle) -> Result<usize, TableError> {
        let index = handle
            .sparse_index()
            .filter(|&i| i < self.sparse.len())
            .ok_or(TableError::OutOfRange {
                index: handle.id() as usize,
                len: self.sparse.len(),
            })?;
        let entry = self.sparse.as_slice()[index];
        if entry.generation != handle.generation() {
            return Err(TableError::StaleHandle { handle });
        }
        let position = entry.link as usize;
        if self.dense_to_sparse.at(position) != Some(&(index as u32)) {
            return Err(TableError::StaleHandle { handle });
        }
        Ok(position)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.locate(handle).is_ok()
    }

    /// The value behind `handle`, or `None` if it is null, out of range or
    /// stale. Stale lookups are normal and are not reported.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let position = self.locate(handle).ok()?;
        self.dense.at(position)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let position = self.locate(handle).ok()?;
        self.dense.at_mut(position)
    }

    /// Overwrite the value behind `handle`, returning the previous one.
    pub fn set(&mut self, handle: Handle, value: T) -> Result<T, TableError> {
        let position = self.locate(handle).map_err(trap::raise)?;
        let slot = &mut self.dense.as_mut_slice()[position];
        Ok(core::mem::replace(slot, value))
    }

    /// Remove the value behind `handle` and retire the handle for good.
    ///
    /// The last dense value is moved into the freed position; `moved`
    /// reports it. An invalid handle leaves the table untouched.
    pub fn discard(&mut self, handle: Handle) -> Result<Discarded<T>, TableError> {
        let position = self.locate(handle).map_err(trap::raise)?;
        let index = handle.id() as usize - 1;
        let last = self.dense.len() - 1;

        let value = self
            .dense
            .swap_remove(position)
            .expect("located position must be live");
        self.dense_to_sparse.swap_remove(position);

        let moved = if position != last {
            let moved_index = self.dense_to_sparse.as_slice()[position] as usize;
            let moved_entry = &mut self.sparse.as_mut_slice()[moved_index];
            debug_assert_eq!(moved_entry.link as usize, last);
            moved_entry.link = position as u32;
            Some(Moved {
                handle: Handle::new(moved_index as u32, moved_entry.generation),
                from: last,
                to: position,
            })
        } else {
            None
        };

        let entry = &mut self.sparse.as_mut_slice()[index];
        entry.generation = entry.generation.wrapping_add(1);
        entry.link = self.free_head;
        self.free_head = index as u32;

        Ok(Discarded { value, moved })
    }

    /// Handle owning dense position `position`.
    pub fn handle_at(&self, position: usize) -> Option<Handle> {
        let index = *self.dense_to_sparse.at(position)?;
        let generation = self.sparse.as_slice()[index as usize].generation;
        Some(Handle::new(index, generation))
    }

    pub fn value_at(&self, position: usize) -> Option<&T> {
        self.dense.at(position)
    }

    /// Live values, packed.
    pub fn values(&self) -> &[T] {
        self.dense.as_slice()
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        self.dense.as_mut_slice()
    }

    /// Yield the next live value in dense order.
    ///
    /// Discarding during a walk reorders the dense array and can skip or
    /// repeat values; collect handles first and discard after the walk.
    pub fn advance(&self, cursor: &mut Cursor) -> Option<(Handle, &T)> {
        let position = cursor.next;
        match (self.handle_at(position), self.dense.at(position)) {
            (Some(handle), Some(value)) => {
                cursor.visit(position);
                Some((handle, value))
            }
            _ => {
                cursor.finish(self.dense.len());
                None
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            owners: self.dense_to_sparse.iter(),
            values: self.dense.iter(),
            sparse: self.sparse.as_slice(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            owners: self.dense_to_sparse.iter(),
            values: self.dense.iter_mut(),
            sparse: self.sparse.as_slice(),
        }
    }

    /// Drop every value and retire every outstanding handle.
    pub fn clear(&mut self) {
        for &index in self.dense_to_sparse.iter() {
            let entry = &mut self.sparse.as_mut_slice()[index as usize];
            entry.generation = entry.generation.wrapping_add(1);
        }
        for (i, entry) in self.sparse.iter_mut().enumerate() {
            entry.link = i as u32 + 1;
        }
        self.free_head = 0;
        self.dense.clear();
        self.dense_to_sparse.clear();
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(Handle, &T)` in dense order.
pub struct Iter<'a, T> {
    owners: core::slice::Iter<'a, u32>,
    values: core::slice::Iter<'a, T>,
    sparse: &'a [SparseEntry],
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.owners.next()?;
        let value = self.values.next()?;
        let generation = self.sparse[index as usize].generation;
        Some((Handle::new(index, generation), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Iterator over `(Handle, &mut T)` in dense order.
pub struct IterMut<'a, T> {
    owners: core::slice::Iter<'a, u32>,
    values: core::slice::IterMut<'a, T>,
    sparse: &'a [SparseEntry],
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (Handle, &'a mut T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.owners.next()?;
        let value = self.values.next()?;
        let generation = self.sparse[index as usize].generation;
        Some((Handle::new(index, generation), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<'a, T: Copy> IntoIterator for &'a HandleTable<T> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
