//! Opaque generational identifiers issued by [`crate::HandleTable`].

use core::fmt;

/// A `(id, generation)` pair naming a value in a handle table.
///
/// `id` is the sparse slot index plus one, so `id == 0` is never issued and
/// [`Handle::NULL`] can stand for "no resource". Handles are plain values:
/// holding one keeps nothing alive, and a handle whose value was discarded
/// simply stops resolving.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle {
    id: u32,
    generation: u32,
}

impl Handle {
    pub const NULL: Handle = Handle {
        id: 0,
        generation: 0,
    };

    pub(crate) const fn new(sparse_index: u32, generation: u32) -> Self {
        Self {
            id: sparse_index + 1,
            generation,
        }
    }

    pub const fn id(self) -> u32 {
        self.id
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }

    pub const fn is_null(self) -> bool {
        self.id == 0
    }

    /// Zero-based sparse slot, or `None` for the null handle.
    pub(crate) fn sparse_index(self) -> Option<usize> {
        (self.id as usize).checked_sub(1)
    }

    /// Pack into one `u64`, generation in the high half.
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.id as u64
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self {
            id: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Handle(null)");
        }
        write!(f, "Handle({}v{})", self.id, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_default() {
        assert_eq!(Handle::default(), Handle::NULL);
        assert!(Handle::NULL.is_null());
        assert_eq!(Handle::NULL.sparse_index(), None);
    }

    #[test]
    fn ids_are_one_based() {
        let h = Handle::new(0, 7);
        assert_eq!(h.id(), 1);
        assert_eq!(h.generation(), 7);
        assert_eq!(h.sparse_index(), Some(0));
        assert!(!h.is_null());
    }

    #[test]
    fn bits_pack_both_halves() {
        let h = Handle::new(41, u32::MAX);
        assert_eq!(Handle::from_bits(h.to_bits()), h);
        assert_eq!(h.to_bits() as u32, 42);
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Handle::new(2, 5)), "Handle(3v5)");
        assert_eq!(format!("{:?}", Handle::NULL), "Handle(null)");
    }
}
