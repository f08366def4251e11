//! Recoverable error kinds shared by every table in the crate.

use crate::handle::Handle;
use thiserror::Error;

/// Why a table operation declined to act.
///
/// None of these are fatal: the table is left untouched and the caller
/// decides what to do. Stale handles in particular are expected in steady
/// state (a resource freed this frame, still referenced by queued work).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum TableError {
    /// An index, slot or handle id lies outside the table's current bounds.
    #[error("index {index} is out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
    /// The handle's id is in range but its generation no longer matches.
    #[error("stale handle {handle:?}")]
    StaleHandle { handle: Handle },
    /// A growth target exceeded the representable capacity.
    #[error("requested capacity {requested} exceeds maximum {max}")]
    CapacityOverflow { requested: usize, max: usize },
}
