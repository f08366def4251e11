#![cfg(test)]

// Property tests for HashTable and HashSet kept inside the crate so they can
// check slot-level state through the public accessors without extra features.

use crate::cursor::Cursor;
use crate::hash_set::HashSet;
use crate::hash_table::{HashTable, Mark};
use crate::hashing::PreHashed;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{BuildHasher, Hash, Hasher};

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Del(usize),
    Get(usize),
    Mutate(usize, i32),
    SweepOdd,
    Iterate,
    Reserve(u8),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    proptest::collection::vec(any::<u64>(), 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            4 => idx.clone().prop_map(OpI::Del),
            3 => idx.clone().prop_map(OpI::Get),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::SweepOdd),
            1 => Just(OpI::Iterate),
            1 => any::<u8>().prop_map(OpI::Reserve),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_state_machine<S>(pool: Vec<u64>, ops: Vec<OpI>, mut sut: HashTable<u64, i32, S>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone + Default,
{
    let mut model: HashMap<u64, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = pool[i];
                let is_new = sut.set(k, v).expect("set below capacity ceiling");
                prop_assert_eq!(is_new, model.insert(k, v).is_none());
            }
            OpI::Del(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.del(&k), model.remove(&k));
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Get(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Mutate(i, d) => {
                let k = pool[i];
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            OpI::SweepOdd => {
                // Periodic sweep: drop odd values through the cursor.
                let mut cursor = Cursor::new();
                while let Some((slot, _, v)) = sut.advance(&mut cursor) {
                    let odd = v % 2 != 0;
                    if odd {
                        prop_assert!(sut.del_at(slot).unwrap().is_some());
                        prop_assert_eq!(sut.mark_at(slot), Some(Mark::Tombstone));
                    }
                }
                model.retain(|_, v| *v % 2 == 0);
            }
            OpI::Iterate => {
                let s: BTreeMap<u64, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let m: BTreeMap<u64, i32> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(sut.iter().count(), sut.len());
                prop_assert_eq!(s, m);
            }
            OpI::Reserve(n) => {
                sut.reserve(n as usize).unwrap();
                prop_assert!(sut.len() + n as usize <= sut.capacity() * 2 / 3);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let cap = sut.capacity();
        prop_assert!(cap == 0 || cap.is_power_of_two());
        prop_assert!(sut.len() * 3 <= cap * 2);
        let occupied = (0..cap).filter(|&i| sut.mark_at(i) == Some(Mark::Occupied)).count();
        prop_assert_eq!(occupied, sut.len());
        // The slot array never fills up, so misses terminate at an Empty.
        if cap > 0 {
            prop_assert!((0..cap).any(|i| sut.mark_at(i) == Some(Mark::Empty)));
        }
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` reports newness exactly when the model had no entry.
// - `get`/`del`/`get_mut` parity, including after tombstones accumulate.
// - Cursor sweeps with `del_at` remove exactly the swept entries.
// - Capacity stays a power of two within the 2/3 load factor, and at least
//   one slot stays Empty.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, HashTable::new())?;
    }
}

// Pre-hashed scalars from a narrow range, the shape of packed resource ids.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_prehashed((pool, ops) in arb_scenario()) {
        let pool = pool.into_iter().map(|k| k % 64).collect();
        run_state_machine(pool, ops, HashTable::with_hasher(PreHashed))?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. Every key shares one probe chain, so tombstones in
// the middle of the chain must never cut it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, HashTable::with_hasher(ConstBuildHasher))?;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
struct Pair(u16, u16);

// Property: HashSet membership matches BTreeSet for inserts and removals,
// through both `remove` and `remove_at`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_membership(ops in proptest::collection::vec((any::<bool>(), 0u16..16, 0u16..4), 1..200)) {
        let mut sut: HashSet<Pair> = HashSet::new();
        let mut model = BTreeSet::new();
        for (insert, a, b) in ops {
            let k = Pair(a, b);
            if insert {
                prop_assert_eq!(sut.insert(k).unwrap(), model.insert(k));
            } else if a % 2 == 0 {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            } else {
                let mut cursor = Cursor::new();
                let mut removed = false;
                while let Some((slot, &m)) = sut.advance(&mut cursor) {
                    if m == k {
                        prop_assert_eq!(sut.remove_at(slot).unwrap(), Some(k));
                        removed = true;
                    }
                }
                prop_assert_eq!(removed, model.remove(&k));
            }
            prop_assert_eq!(sut.len(), model.len());
            for m in &model {
                prop_assert!(sut.contains(m));
            }
        }
        let got: BTreeSet<Pair> = sut.iter().copied().collect();
        prop_assert_eq!(got, model);
    }
}

#[test]
fn hash_is_never_recomputed_after_insert() {
    use std::cell::Cell;

    thread_local! {
        static CALLS: Cell<usize> = const { Cell::new(0) };
    }

    #[derive(Copy, Clone, Eq, PartialEq)]
    struct Counted(u32);
    impl Hash for Counted {
        fn hash<H: Hasher>(&self, state: &mut H) {
            CALLS.with(|c| c.set(c.get() + 1));
            self.0.hash(state);
        }
    }

    let mut t: HashTable<Counted, u32> = HashTable::new();
    for k in 0..200 {
        t.set(Counted(k), k).unwrap();
    }
    // One hash per `set`; the growths in between hashed nothing.
    assert_eq!(CALLS.with(Cell::get), 200);
    t.resize(4_096).unwrap();
    assert_eq!(CALLS.with(Cell::get), 200);
}
