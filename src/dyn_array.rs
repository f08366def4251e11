//! DynArray: growable buffer of plain-data elements with explicit capacity
//! control.
//!
//! Elements are `Copy`, so growth and shifting move bytes and nothing else.
//! Growth goes through [`crate::growth::next_capacity`]; shrinking happens
//! only through [`DynArray::resize`]. Any growth invalidates references
//! previously taken into the array, which the borrow checker enforces by
//! never handing out a borrow that outlives a mutating call.
//!
//! Growth never aborts. A request past [`MAX_CAPACITY`] or an allocation
//! the system refuses returns `TableError::CapacityOverflow` and leaves the
//! array as it was.

use crate::error::TableError;
use crate::growth::{self, MAX_CAPACITY};
use crate::trap;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DynArray<T> {
    data: Vec<T>,
}

impl<T: Copy> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> DynArray<T> {
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// A reservation that cannot be met is reported and the array starts
    /// unallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut a = Self::new();
        let _ = a.ensure(capacity);
        a
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Drop all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Reallocate to hold exactly `target` elements (the allocator may round
    /// up). Shrinking below `len` truncates.
    pub fn resize(&mut self, target: usize) -> Result<(), TableError> {
        if target > MAX_CAPACITY {
            return Err(trap::raise(TableError::CapacityOverflow {
                requested: target,
                max: MAX_CAPACITY,
            }));
        }
        if target > self.data.capacity() {
            self.reserve_total(target)?;
        } else {
            self.data.truncate(target);
            self.data.shrink_to(target);
        }
        Ok(())
    }

    /// Make room for at least `min_capacity` elements, growing by the
    /// array growth policy. Never shrinks.
    pub fn ensure(&mut self, min_capacity: usize) -> Result<(), TableError> {
        let capacity = self.data.capacity();
        if capacity >= min_capacity {
            return Ok(());
        }
        let grown = growth::next_capacity(capacity, min_capacity - capacity);
        if grown.clamped {
            return Err(trap::raise(TableError::CapacityOverflow {
                requested: min_capacity,
                max: MAX_CAPACITY,
            }));
        }
        if self.reserve_total(grown.capacity).is_ok() {
            return Ok(());
        }
        // The policy's headroom was refused; settle for exactly what was asked.
        self.reserve_total(min_capacity)
    }

    fn reserve_total(&mut self, capacity: usize) -> Result<(), TableError> {
        let additional = capacity.saturating_sub(self.data.len());
        self.data.try_reserve_exact(additional).map_err(|err| {
            log::debug!("array allocation for {capacity} elements refused: {err}");
            trap::raise(TableError::CapacityOverflow {
                requested: capacity,
                max: MAX_CAPACITY,
            })
        })
    }

    pub fn push(&mut self, value: T) -> Result<(), TableError> {
        self.ensure(self.data.len().saturating_add(1))?;
        self.data.push(value);
        Ok(())
    }

    /// Append `values` to the end.
    pub fn push_many(&mut self, values: &[T]) -> Result<(), TableError> {
        self.ensure(self.data.len().saturating_add(values.len()))?;
        self.data.extend_from_slice(values);
        Ok(())
    }

    /// Overwrite `values.len()` elements starting at `index`.
    pub fn set_many(&mut self, index: usize, values: &[T]) -> Result<(), TableError> {
        let end = index.saturating_add(values.len());
        if end > self.data.len() {
            return Err(trap::raise(TableError::OutOfRange {
                index: end,
                len: self.data.len(),
            }));
        }
        self.data[index..end].copy_from_slice(values);
        Ok(())
    }

    /// Insert `values` before `index`, shifting the tail right.
    /// `index == len` appends.
    pub fn insert_many(&mut self, index: usize, values: &[T]) -> Result<(), TableError> {
        let len = self.data.len();
        if index > len {
            return Err(trap::raise(TableError::OutOfRange { index, len }));
        }
        self.ensure(len.saturating_add(values.len()))?;
        self.data.splice(index..index, values.iter().copied());
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        let v = self.data.pop();
        if v.is_none() {
            trap::report(&TableError::OutOfRange { index: 0, len: 0 });
        }
        v
    }

    /// Drop the last `n` elements. Declines without change if fewer exist.
    pub fn pop_many(&mut self, n: usize) -> Result<(), TableError> {
        let len = self.data.len();
        if n > len {
            return Err(trap::raise(TableError::OutOfRange { index: n, len }));
        }
        self.data.truncate(len - n);
        Ok(())
    }

    /// Element `depth` positions from the end; `peek(0)` is the last one.
    pub fn peek(&self, depth: usize) -> Option<&T> {
        let len = self.data.len();
        if depth >= len {
            return None;
        }
        self.data.get(len - depth - 1)
    }

    pub fn at(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    /// Move the last element into `index` and return what was there.
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        if index >= self.data.len() {
            return None;
        }
        Some(self.data.swap_remove(index))
    }

    pub fn find_position<F>(&self, mut pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.data.iter().position(|v| pred(v))
    }

    /// Remove every element matching `pred`, preserving the order of the
    /// rest. Returns how many were removed.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.data.len();
        self.data.retain(|v| !pred(v));
        before - self.data.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }
}

impl<'a, T: Copy> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Copy> From<&[T]> for DynArray<T> {
    fn from(values: &[T]) -> Self {
        Self {
            data: values.to_vec(),
        }
    }
}
