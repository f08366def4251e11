//! Probe guard for [`crate::HashTable`].
//!
//! Lookups and `set` hash the query and compare it against stored keys, which
//! runs the caller's `Hash` and `Eq` impls with the slot array mid-probe. A
//! key impl that calls back into the same table (say, a `contains_key` from
//! inside `eq`) would see that half-done probe, so the table wraps each probe
//! in [`ProbeGuard::enter`] and debug builds panic on the nested call.
//!
//! Rehashing and cursor sweeps never call key code: placement uses the hash
//! stored in each bucket. They run without the guard. Release builds keep
//! only the zero-sized marker that makes tables `!Send` and `!Sync`.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table entry tracker.
#[derive(Debug)]
pub struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // The tables are single-threaded; keep them !Send + !Sync.
    _unsync: PhantomData<*mut ()>,
}

impl ProbeGuard {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Mark a probe as running until the returned token drops.
    #[inline]
    pub fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrant call into a hash table while it was probing"
            );
            Entered { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Entered { _lt: PhantomData }
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProbeGuard {
    // A copy of a table is never mid-probe.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Token returned by [`ProbeGuard::enter`].
pub struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
