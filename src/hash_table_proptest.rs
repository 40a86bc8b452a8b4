#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check
// internal counters and the planner step directly.

use crate::capacity::CAPACITIES;
use crate::config::Config;
use crate::error::Error;
use crate::hash_table::HashTable;
use crate::probe::ProbingMethod;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations: indices shrink to earlier keys and op lists
// shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Search(usize),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario(max_pool: usize) -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::btree_set(any::<u32>(), 1..=max_pool).prop_flat_map(|pool| {
        let pool: Vec<u32> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Search),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_structure<V, S: BuildHasher>(t: &HashTable<u32, V, S>) -> Result<(), TestCaseError> {
    prop_assert!(t.active_count() <= t.used_count());
    prop_assert!(t.used_count() <= t.size());
    prop_assert!(t.min_size() <= t.size() && t.size() <= t.max_size());
    prop_assert_eq!(CAPACITIES[t.capacity_step()] as usize, t.size());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - insert succeeds iff the key is absent; duplicates leave the value alone.
// - remove returns the stored pair iff present; a repeat fails KeyNotFound.
// - search/fetch round-trip to the model's value.
// - active_count == model.len() and structural bounds hold after every op.
fn run_state_machine<S: BuildHasher>(
    mut sut: HashTable<u32, i32, S>,
    pool: &[u32],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u32, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i];
                match sut.insert(k, v) {
                    Ok(index) => {
                        prop_assert!(!model.contains_key(&k), "insert must fail on duplicate");
                        prop_assert_eq!(sut.fetch(index), Ok(&v));
                        model.insert(k, v);
                    }
                    Err(Error::KeyExists) => {
                        prop_assert!(model.contains_key(&k), "KeyExists only when present");
                        prop_assert_eq!(sut.get(&k), model.get(&k));
                    }
                    Err(e) => {
                        prop_assert!(false, "unexpected insert error: {}", e);
                    }
                }
            }
            Op::Remove(i) => {
                let k = pool[i];
                match model.remove(&k) {
                    Some(mv) => {
                        prop_assert_eq!(sut.remove(&k), Ok((k, mv)));
                        prop_assert_eq!(sut.remove(&k), Err(Error::KeyNotFound));
                    }
                    None => {
                        prop_assert_eq!(sut.remove(&k), Err(Error::KeyNotFound));
                    }
                }
            }
            Op::Search(i) => {
                let k = pool[i];
                match (sut.search(&k), model.get(&k)) {
                    (Some(index), Some(mv)) => {
                        prop_assert_eq!(sut.fetch(index), Ok(mv));
                    }
                    (None, None) => {}
                    (found, expected) => {
                        prop_assert!(false, "search {:?} vs model {:?}", found, expected);
                    }
                }
            }
            Op::Mutate(i, d) => {
                let k = pool[i];
                if let Some(index) = sut.search(&k) {
                    let v = sut.fetch_mut(index).map_err(|e| TestCaseError::fail(e.to_string()))?;
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("model has key");
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let seen: BTreeSet<_> = sut.iter().map(|(_, k, v)| (*k, *v)).collect();
                let expected: BTreeSet<_> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(seen, expected);
            }
        }
        prop_assert_eq!(sut.active_count(), model.len());
        check_structure(&sut)?;
    }
    Ok(())
}

// Constant hasher: every key shares one probe sequence.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

thread_local! {
    static EQ_CALLS: Cell<usize> = const { Cell::new(0) };
}

fn counting_eq(a: &u32, b: &u32) -> bool {
    EQ_CALLS.with(|c| c.set(c.get() + 1));
    a == b
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine_linear((pool, ops) in arb_scenario(48)) {
        let sut = HashTable::new().unwrap();
        run_state_machine(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_quadratic((pool, ops) in arb_scenario(48)) {
        let cfg = Config::new().probing(ProbingMethod::Quadratic);
        run_state_machine(HashTable::with_config(cfg).unwrap(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(12)) {
        let cfg = Config::with_hasher(ConstBuildHasher);
        run_state_machine(HashTable::with_config(cfg).unwrap(), &pool, ops)?;
    }

    // Property: search and insert compare against at most `size` slots.
    #[test]
    fn prop_probe_count_bounded(keys in proptest::collection::vec(0u32..64, 1..80)) {
        let cfg = Config::with_hasher(ConstBuildHasher).equality(counting_eq);
        let mut t: HashTable<u32, (), ConstBuildHasher> = HashTable::with_config(cfg).unwrap();
        for k in keys {
            let size = t.size();
            EQ_CALLS.with(|c| c.set(0));
            let _ = t.search(&k);
            prop_assert!(EQ_CALLS.with(Cell::get) <= size);

            EQ_CALLS.with(|c| c.set(0));
            let size = t.size();
            let _ = if k % 3 == 0 { t.remove(&k).map(|_| ()) } else { t.insert(k, ()).map(|_| ()) };
            prop_assert!(EQ_CALLS.with(Cell::get) <= size);
        }
    }

    // Property: growth keeps the live ratio under the load factor, whatever
    // the factor.
    #[test]
    fn prop_growth_bounds_load(n in 1usize..600, load_factor in 0.01f64..=0.9) {
        let cfg = Config::new().load_factor(load_factor).min_load_factor(0.0);
        let mut t: HashTable<u32, u32> = HashTable::with_config(cfg).unwrap();
        for k in 0..n as u32 {
            t.insert(k, k).unwrap();
            prop_assert!((t.active_count() as f64 / t.size() as f64) < t.load_factor());
        }
        for k in 0..n as u32 {
            prop_assert_eq!(t.get(&k), Some(&k));
        }
    }
}
