//! Debug-only trap layered over recoverable errors.
//!
//! Every reported error is logged at `warn` level. With the `debug-trap`
//! feature enabled in a debug build the report then panics, stopping at the
//! call site like a breakpoint would. In every other configuration the
//! caller just gets its `Err`/`None` back.

use crate::error::TableError;

/// Log `err` and, when trapping is enabled, panic.
#[inline]
#[track_caller]
pub(crate) fn report(err: &TableError) {
    log::warn!("{err}");

    #[cfg(all(debug_assertions, feature = "debug-trap"))]
    {
        panic!("debug trap: {err}");
    }
}

/// Report `err` and hand it back, for use in `Err(trap::raise(..))`.
#[inline]
#[track_caller]
pub(crate) fn raise(err: TableError) -> TableError {
    report(&err);
    err
}

/// Whether `report` panics in this build.
pub const fn enabled() -> bool {
    cfg!(all(debug_assertions, feature = "debug-trap"))
}
