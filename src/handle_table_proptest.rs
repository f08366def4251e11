#![cfg(test)]

// Property tests for HandleTable against slotmap::SlotMap as the reference
// model. Handles are tracked per model key so every operation can be
// compared on both sides.

use crate::cursor::Cursor;
use crate::handle::Handle;
use crate::handle_table::HandleTable;
use proptest::prelude::*;
use slotmap::{DefaultKey, SlotMap};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
enum Op {
    Acquire(u32),
    // Index into the currently live handles, taken modulo their count.
    Discard(usize),
    Get(usize),
    Set(usize, u32),
    Mutate(usize, u32),
    Iterate,
    Walk,
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        8 => any::<u32>().prop_map(Op::Acquire),
        5 => any::<usize>().prop_map(Op::Discard),
        3 => any::<usize>().prop_map(Op::Get),
        2 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Set(i, v)),
        2 => (any::<usize>(), any::<u32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
        1 => Just(Op::Iterate),
        1 => Just(Op::Walk),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..150)
}

// Property: State-machine equivalence against slotmap::SlotMap.
// Invariants exercised across random operation sequences:
// - `acquire` never returns the null handle or a handle that is still live.
// - `get`/`set`/`get_mut` parity for live handles.
// - `discard` returns the model's value; the reported move names the handle
//   that now owns the freed position.
// - Stale handles never resolve, even after their slot is reused.
// - `iter` and the cursor walk yield every live handle exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: HandleTable<u32> = HandleTable::new();
        let mut model: SlotMap<DefaultKey, u32> = SlotMap::new();
        let mut live: Vec<(Handle, DefaultKey)> = Vec::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(v) => {
                    let h = sut.acquire(v).unwrap();
                    prop_assert!(!h.is_null());
                    prop_assert!(live.iter().all(|(l, _)| *l != h));
                    let k = model.insert(v);
                    live.push((h, k));
                }
                Op::Discard(i) if !live.is_empty() => {
                    let (h, k) = live.swap_remove(i % live.len());
                    let d = sut.discard(h).unwrap();
                    prop_assert_eq!(Some(d.value), model.remove(k));
                    if let Some(m) = d.moved {
                        prop_assert_ne!(m.handle, h);
                        prop_assert_eq!(m.from, sut.len());
                        prop_assert_eq!(sut.handle_at(m.to), Some(m.handle));
                    }
                    stale.push(h);
                }
                Op::Get(i) if !live.is_empty() => {
                    let (h, k) = live[i % live.len()];
                    prop_assert_eq!(sut.get(h), model.get(k));
                }
                Op::Set(i, v) if !live.is_empty() => {
                    let (h, k) = live[i % live.len()];
                    let old = sut.set(h, v).unwrap();
                    let slot = model.get_mut(k).unwrap();
                    prop_assert_eq!(old, *slot);
                    *slot = v;
                }
                Op::Mutate(i, d) if !live.is_empty() => {
                    let (h, k) = live[i % live.len()];
                    let v = sut.get_mut(h).unwrap();
                    *v = v.wrapping_add(d);
                    let m = model.get_mut(k).unwrap();
                    *m = m.wrapping_add(d);
                }
                Op::Iterate => {
                    let by_handle: BTreeMap<Handle, u32> = sut.iter().map(|(h, v)| (h, *v)).collect();
                    prop_assert_eq!(by_handle.len(), sut.len());
                    let expected: BTreeMap<Handle, u32> =
                        live.iter().map(|(h, k)| (*h, model[*k])).collect();
                    prop_assert_eq!(by_handle, expected);
                }
                Op::Walk => {
                    let mut cursor = Cursor::new();
                    let mut seen = BTreeSet::new();
                    while let Some((h, v)) = sut.advance(&mut cursor) {
                        prop_assert!(seen.insert(h), "handle visited twice");
                        prop_assert_eq!(sut.get(h), Some(v));
                    }
                    let expected: BTreeSet<Handle> = live.iter().map(|(h, _)| *h).collect();
                    prop_assert_eq!(seen, expected);
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    stale.extend(live.drain(..).map(|(h, _)| h));
                }
                _ => {}
            }

            // Post-conditions after each op
            for &h in &stale {
                prop_assert!(sut.get(h).is_none());
                prop_assert!(!sut.contains(h));
            }
            for &(h, _) in &live {
                prop_assert!(sut.contains(h));
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.values().len(), sut.len());
        }
    }
}

// Property: `to_bits`/`from_bits` preserve every issued handle, so packed
// handles can key a hash table.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_packed_handles_resolve(values in proptest::collection::vec(any::<u16>(), 1..64), drop_every in 2usize..5) {
        let mut sut = HandleTable::new();
        let hs: Vec<Handle> = values.iter().map(|v| sut.acquire(*v).unwrap()).collect();
        for h in hs.iter().step_by(drop_every) {
            sut.discard(*h).unwrap();
        }
        for (i, h) in hs.iter().enumerate() {
            let back = Handle::from_bits(h.to_bits());
            prop_assert_eq!(back, *h);
            let expected = if i % drop_every == 0 { None } else { Some(&values[i]) };
            prop_assert_eq!(sut.get(back), expected);
        }
    }
}
