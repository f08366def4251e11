use resource_tables::{Handle, HandleTable, HashTable, TableError};

// Lookups never report, so they stay quiet even when trapping is on.
#[test]
fn misses_never_trap() {
    let t: HandleTable<u8> = HandleTable::new();
    assert_eq!(t.get(Handle::NULL), None);
    assert_eq!(t.get(Handle::from_bits(u64::MAX)), None);
    let m: HashTable<u8, u8> = HashTable::new();
    assert_eq!(m.get(&1), None);
}

#[cfg(all(debug_assertions, feature = "debug-trap"))]
#[test]
fn discard_of_stale_handle_traps() {
    let mut t = HandleTable::new();
    let h = t.acquire(1u8).unwrap();
    t.discard(h).unwrap();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = t.discard(h);
    }));
    assert!(res.is_err(), "expected the debug trap to fire");
}

#[cfg(not(all(debug_assertions, feature = "debug-trap")))]
#[test]
fn errors_are_returned_without_trapping() {
    assert!(!resource_tables::trap_enabled());
    let mut t = HandleTable::new();
    let h = t.acquire(1u8).unwrap();
    t.discard(h).unwrap();
    assert_eq!(t.discard(h), Err(TableError::StaleHandle { handle: h }));

    let mut m: HashTable<u8, u8> = HashTable::new();
    m.set(1, 1).unwrap();
    let cap = m.capacity();
    assert_eq!(
        m.del_at(cap),
        Err(TableError::OutOfRange { index: cap, len: cap })
    );
}
