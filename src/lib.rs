//! resource-tables: identity and lookup containers for plain-data
//! resources. Generational handles with packed storage, plus an
//! open-addressing hash table with tombstone deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one small, generic substrate for "give me a stable name for this
//!   GPU object" and "have I already rendered this glyph", instead of a
//!   hand-rolled table per subsystem.
//! - Layers (leaves first):
//!   - `growth`: pure capacity arithmetic shared by every container. Arrays
//!     grow by 3/2 from a floor of 8; hash tables use powers of two and a
//!     2/3 load factor.
//!   - `DynArray<T>`: growable buffer of `Copy` values that follows the
//!     shared growth policy.
//!   - `HashTable<K, V, S>`: linear probing over Empty/Tombstone/Occupied
//!     slots, with a debug-only probe guard around user `Hash`/`Eq`.
//!     `HashSet<K, S>` is its key-only form.
//!   - `HandleTable<T>`: slot map built from three `DynArray`s (dense
//!     values, dense-to-sparse back-pointers, sparse entries threaded into
//!     a free list). Issues `Handle { id, generation }`.
//!
//! Constraints
//! - Single-threaded: tables are `!Send`/`!Sync` where they hold a probe
//!   guard, and carry no locking anywhere.
//! - Plain data only: keys and values are `Copy`. Storage moves them freely
//!   on growth, rehash and swap-compaction.
//! - No long-lived borrows: every accessor borrows the table, so a
//!   reference cannot survive a mutating call. Re-derive by key or handle.
//! - Stale handles and missing keys are ordinary outcomes (`None` or
//!   `Err(TableError)`), never panics.
//!
//! Handles
//! - `id` is the 1-based sparse index; `id == 0` is `Handle::NULL` and is
//!   never issued.
//! - A live handle's sparse entry and dense back-pointer agree in both
//!   directions. `discard` bumps the generation before the slot is reused,
//!   so an old handle never resolves to a new value.
//! - Generations are `u32` and wrap. A handle can alias only after its slot
//!   has been reused 2^32 times while the handle was kept.
//! - `discard` swap-removes and reports the relocated element as `Moved`.
//!
//! Hashing and rehashing
//! - Each Occupied slot stores the key's `u64` hash. Probes compare stored
//!   hashes first; rehash uses only stored hashes, so `K: Hash` is never
//!   invoked after insertion.
//! - Tombstones are reused by insertion. When live entries plus tombstones
//!   would exceed the load factor, the table is rehashed at the same
//!   capacity if the live entries fit in half of it, and grows otherwise.
//!   Each rehash frees at least a sixth of the slots.
//!
//! Errors and traps
//! - `TableError` covers out-of-range indices, stale handles and capacity
//!   overflow. Errors returned from mutating calls are logged at `warn`.
//! - Sizing never aborts: an over-limit request or a refused allocation
//!   returns `CapacityOverflow` with the container unchanged.
//! - The `debug-trap` feature turns those reports into panics in debug
//!   builds, as a stand-in for a debugger breakpoint.

mod cursor;
pub mod dyn_array;
mod error;
pub mod growth;
mod handle;
pub mod handle_table;
mod handle_table_proptest;
pub mod hash_set;
pub mod hash_table;
mod hash_table_proptest;
pub mod hashing;
mod reentrancy;
mod trap;

// Public surface
pub use cursor::Cursor;
pub use dyn_array::DynArray;
pub use error::TableError;
pub use growth::Grown;
pub use handle::Handle;
pub use handle_table::{Discarded, HandleTable, Moved};
pub use hash_set::HashSet;
pub use hash_table::{HashTable, Mark};
pub use hashing::{DefaultHashBuilder, PodKey, PreHashed};
pub use trap::enabled as trap_enabled;
