//! Growth policy shared by the arrays and tables.
//!
//! Arrays grow by 3/2 from a floor of [`MIN_CAPACITY`]. Hash tables use
//! power-of-two capacities and grow before an insertion would push the
//! occupied count past 2/3 of the capacity. Requests past the ceiling are
//! clamped and flagged instead of wrapping.

/// Smallest capacity ever allocated.
pub const MIN_CAPACITY: usize = 8;

/// Ceiling for array and handle-table capacities; ids must fit in `u32`.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// Largest power of two a hash table may use.
pub const MAX_HASH_CAPACITY: usize = 1 << 31;

/// Load factor numerator and denominator: tables stay at most 2/3 full.
pub const LOAD_NUM: usize = 2;
pub const LOAD_DEN: usize = 3;

/// A computed capacity, with a flag set when the request had to be clamped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Grown {
    pub capacity: usize,
    pub clamped: bool,
}

impl Grown {
    fn exact(capacity: usize) -> Self {
        Self {
            capacity,
            clamped: false,
        }
    }

    fn clamp(capacity: usize) -> Self {
        Self {
            capacity,
            clamped: true,
        }
    }
}

/// Capacity for an array currently sized `current` that must hold
/// `additional` more elements.
///
/// The result is at least `current + additional` unless clamped, never
/// below `MIN_CAPACITY`, and equal to `current` when nothing more is needed
/// and `current` is already past the floor.
pub fn next_capacity(current: usize, additional: usize) -> Grown {
    let target = match current.checked_add(additional) {
        Some(t) if t <= MAX_CAPACITY => t,
        _ => return Grown::clamp(MAX_CAPACITY),
    };

    let mut capacity = current.max(MIN_CAPACITY);
    while capacity < target {
        // 3/2 step; the ceiling check above keeps this from overflowing.
        capacity = capacity.saturating_add(capacity / 2).min(MAX_CAPACITY);
    }
    Grown::exact(capacity)
}

/// Whether a hash table of `capacity` holding `count` occupied slots must
/// grow before accepting one more.
pub fn should_grow(capacity: usize, count: usize) -> bool {
    exceeds_load(capacity, count.saturating_add(1))
}

/// Whether a table whose tombstones pushed it to the load limit can be
/// rehashed at the same `capacity`. True while `count + 1` fits in half the
/// slots, so a purge frees at least a sixth of the table for further churn;
/// otherwise the table grows.
pub fn rehash_in_place(capacity: usize, count: usize) -> bool {
    (count as u128 + 1) * 2 <= capacity as u128
}

/// `count * 3 > capacity * 2`, computed without overflow.
pub(crate) fn exceeds_load(capacity: usize, count: usize) -> bool {
    (count as u128) * (LOAD_DEN as u128) > (capacity as u128) * (LOAD_NUM as u128)
}

/// Smallest power-of-two capacity (at least `MIN_CAPACITY`) that holds
/// `count` entries without exceeding the load factor.
pub fn hash_capacity_for(count: usize) -> Grown {
    let mut capacity = MIN_CAPACITY;
    while exceeds_load(capacity, count) {
        if capacity >= MAX_HASH_CAPACITY {
            return Grown::clamp(MAX_HASH_CAPACITY);
        }
        capacity <<= 1;
    }
    Grown::exact(capacity)
}

/// Round `target` up to a power of two within the hash-table ceiling.
pub fn round_hash_capacity(target: usize) -> Grown {
    if target > MAX_HASH_CAPACITY {
        return Grown::clamp(MAX_HASH_CAPACITY);
    }
    Grown::exact(target.max(MIN_CAPACITY).next_power_of_two())
}
