//! Hashing capabilities for [`crate::HashTable`] keys.
//!
//! Tables take any `BuildHasher`. Two extra shapes cover the keys the
//! engine actually stores:
//! - [`PreHashed`]: scalar keys (packed `(codepoint, size)` glyph keys,
//!   resource ids) hashed with a single finalizing mix instead of a full
//!   keyed hash.
//! - [`PodKey`]: fixed-size plain-data blobs, hashed and compared as bytes.

use bytemuck::Pod;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};

/// Hasher used when a table is created with `new()`.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// Builds [`ScalarHasher`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct PreHashed;

impl BuildHasher for PreHashed {
    type Hasher = ScalarHasher;

    fn build_hasher(&self) -> ScalarHasher {
        ScalarHasher(0)
    }
}

/// Cheap hasher for integer keys.
///
/// Integer writes are folded together and the result goes through a
/// bijective 64-bit finalizer, so distinct scalars never collide and every
/// input bit reaches the low bits that pick a home slot. Byte writes
/// (non-integer keys) are folded in FNV-1a style so the hasher stays total.
#[derive(Copy, Clone, Debug, Default)]
pub struct ScalarHasher(u64);

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl Hasher for ScalarHasher {
    fn finish(&self) -> u64 {
        let mut h = self.0;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^ (h >> 33)
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut h = if self.0 == 0 { FNV_OFFSET } else { self.0 };
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        self.0 = h;
    }

    fn write_u8(&mut self, n: u8) {
        self.mix(n as u64);
    }

    fn write_u16(&mut self, n: u16) {
        self.mix(n as u64);
    }

    fn write_u32(&mut self, n: u32) {
        self.mix(n as u64);
    }

    fn write_u64(&mut self, n: u64) {
        self.mix(n);
    }

    fn write_usize(&mut self, n: usize) {
        self.mix(n as u64);
    }
}

impl ScalarHasher {
    // A single write on a fresh hasher stores the value as is.
    #[inline]
    fn mix(&mut self, n: u64) {
        self.0 = self.0.wrapping_mul(FNV_PRIME) ^ n;
    }
}

/// A plain-data key hashed and compared by its bytes.
///
/// `T` must be `Pod`, which rules out padding and pointers, so byte
/// equality is value equality.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct PodKey<T>(pub T);

impl<T: Pod> PodKey<T> {
    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.0)
    }
}

impl<T: Pod> PartialEq for PodKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl<T: Pod> Eq for PodKey<T> {}

impl<T: Pod> Hash for PodKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.bytes());
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for PodKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Pod> From<T> for PodKey<T> {
    fn from(v: T) -> Self {
        PodKey(v)
    }
}
