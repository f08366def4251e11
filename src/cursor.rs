//! Explicit iteration cursor.
//!
//! Both tables expose `advance(&mut Cursor)` in addition to borrowing
//! iterators. A cursor holds only positions, so the caller can drop the
//! yielded references and mutate the table between steps (for example
//! `HashTable::del_at` on the slot just visited).

/// Position of an in-progress walk over a table's storage.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Cursor {
    pub(crate) current: Option<usize>,
    pub(crate) next: usize,
}

impl Cursor {
    pub const fn new() -> Self {
        Self {
            current: None,
            next: 0,
        }
    }

    /// Storage index of the element most recently yielded.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn visit(&mut self, index: usize) {
        self.current = Some(index);
        self.next = index + 1;
    }

    pub(crate) fn finish(&mut self, end: usize) {
        self.current = None;
        self.next = end;
    }
}
