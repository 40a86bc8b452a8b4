// HashTable integration suite.
//
// Each test names the behavior it verifies. Core invariants exercised:
// - Round trip: a successful insert is found by search and fetch.
// - Uniqueness: a duplicate insert fails KeyExists and keeps the old value.
// - Accounting: active_count tracks live keys through grow and shrink.
// - Bounds: size stays a planner capacity inside [min_size, max_size].
// - Exhaustion: a saturated table reports NoSpace instead of corrupting.
use oa_hashtable::fnv::FnvBuildHasher;
use oa_hashtable::{
    Config, Error, HashTable, ProbingMethod, SlotIndex, SlotState, CAPACITIES, DEFAULT_MIN_SIZE,
};

fn is_planned_capacity(size: usize) -> bool {
    CAPACITIES.iter().any(|&c| c as usize == size)
}

// Scenario A: default table, insert then search then fetch.
#[test]
fn insert_search_fetch_round_trip() {
    let mut t: HashTable<i32, i32> = HashTable::new().expect("default config");
    assert_eq!(t.insert(1, 100).map(|_| ()), Ok(()));
    let i = t.search(&1).expect("present");
    assert_eq!(t.fetch(i), Ok(&100));
}

// Scenario B: a second insert of the same key fails and does not overwrite.
#[test]
fn duplicate_key_rejected() {
    let mut t: HashTable<i32, i32> = HashTable::new().unwrap();
    t.insert(2, 200).unwrap();
    assert_eq!(t.insert(2, 300), Err(Error::KeyExists));
    assert_eq!(t.get(&2), Some(&200));
}

// Scenario C: inserting past load_factor * initial size grows the table to a
// later capacity in the sequence; every key keeps its value.
#[test]
fn growth_past_initial_capacity() {
    let mut t: HashTable<u64, u64> = HashTable::new().unwrap();
    let initial = t.size();
    let n = (t.load_factor() * initial as f64) as u64 + 50;
    for k in 0..n {
        t.insert(k, k * k).unwrap();
    }
    assert!(t.size() > initial);
    assert!(is_planned_capacity(t.size()));
    assert!((n as f64) / (t.size() as f64) < t.load_factor());
    for k in 0..n {
        let i = t.search(&k).expect("key survives growth");
        assert_eq!(t.fetch(i), Ok(&(k * k)));
    }
    assert_eq!(t.active_count(), n as usize);
}

// Scenario D: insert 10, remove 8; two survivors, size never under min_size.
#[test]
fn mass_removal_keeps_survivors() {
    let mut t: HashTable<u32, String> = HashTable::new().unwrap();
    for k in 0..10 {
        t.insert(k, format!("v{k}")).unwrap();
    }
    for k in 0..8 {
        let (rk, rv) = t.remove(&k).unwrap();
        assert_eq!((rk, rv), (k, format!("v{k}")));
        assert!(t.size() >= DEFAULT_MIN_SIZE);
        assert!(is_planned_capacity(t.size()));
    }
    assert_eq!(t.active_count(), 2);
    assert_eq!(t.get(&8).map(String::as_str), Some("v8"));
    assert_eq!(t.get(&9).map(String::as_str), Some("v9"));
    for k in 0..8 {
        assert!(t.search(&k).is_none());
    }
}

// Scenario E: a small max_size with load_factor 1.0 fills up, then NoSpace.
#[test]
fn saturated_table_reports_no_space() {
    let cfg = Config::new()
        .min_size(2)
        .max_size(5)
        .load_factor(1.0)
        .min_load_factor(0.0);
    let mut t: HashTable<u32, u32> = HashTable::with_config(cfg).unwrap();
    let mut k = 0;
    while t.active_count() < t.size() {
        t.insert(k, k).unwrap();
        k += 1;
    }
    assert_eq!(t.size(), 5);
    assert_eq!(t.insert(1000, 0), Err(Error::NoSpace));
    // Still fully usable: remove one and its slot can be reused.
    t.remove(&0).unwrap();
    assert!(t.insert(1000, 0).is_ok());
    assert_eq!(t.active_count(), 5);
}

#[test]
fn idempotent_removal() {
    let mut t: HashTable<&str, u8> = HashTable::new().unwrap();
    t.insert("k", 1).unwrap();
    assert_eq!(t.remove(&"k"), Ok(("k", 1)));
    assert_eq!(t.remove(&"k"), Err(Error::KeyNotFound));
    assert_eq!(t.remove(&"never"), Err(Error::KeyNotFound));
}

#[test]
fn reinsert_after_remove_sees_new_value() {
    let mut t: HashTable<String, i32> = HashTable::new().unwrap();
    t.insert("k".to_string(), 1).unwrap();
    t.remove(&"k".to_string()).unwrap();
    t.insert("k".to_string(), 2).unwrap();
    assert_eq!(t.get(&"k".to_string()), Some(&2));
    assert_eq!(t.active_count(), 1);
}

#[test]
fn invalid_configurations_are_rejected() {
    let cases: Vec<(Config<u32>, Error)> = vec![
        (
            Config::new().load_factor(0.0),
            Error::InvalidArgument("load_factor must be in (0, 1]"),
        ),
        (
            Config::new().min_size(64).max_size(32),
            Error::InvalidArgument("min_size exceeds max_size"),
        ),
        (
            Config::new().min_size(18).max_size(36),
            Error::InvalidArgument("no capacity lies between min_size and max_size"),
        ),
        (
            Config::new().probing(ProbingMethod::DoubleHashing),
            Error::InvalidState("double hashing is not supported"),
        ),
    ];
    for (cfg, expected) in cases {
        assert_eq!(HashTable::<u32, u32>::with_config(cfg).err(), Some(expected));
    }
}

#[test]
fn fetch_out_of_range_is_invalid_argument() {
    let t: HashTable<u32, u32> = HashTable::new().unwrap();
    assert!(matches!(
        t.fetch(SlotIndex::from(usize::MAX)),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        t.fetch(SlotIndex::from(0)),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn quadratic_probing_round_trip() {
    let cfg = Config::new().probing(ProbingMethod::Quadratic);
    let mut t: HashTable<u32, u32> = HashTable::with_config(cfg).unwrap();
    assert_eq!(t.probing(), ProbingMethod::Quadratic);
    for k in 0..500 {
        t.insert(k, k ^ 0xa5a5).unwrap();
    }
    for k in (0..500).step_by(2) {
        t.remove(&k).unwrap();
    }
    for k in 0..500 {
        let expected = (k % 2 == 1).then_some(k ^ 0xa5a5);
        assert_eq!(t.get(&k).copied(), expected);
    }
    assert_eq!(t.active_count(), 250);
}

#[test]
fn render_snapshot_is_deterministic_with_fnv() {
    let build = || {
        let mut t: HashTable<u32, u32, FnvBuildHasher> =
            HashTable::with_config(Config::with_hasher(FnvBuildHasher::default())).unwrap();
        for k in [3, 1, 4, 1, 5] {
            let _ = t.insert(k, k * 10);
        }
        t.remove(&4).unwrap();
        t
    };
    let fmt = |state: SlotState, k: Option<&u32>, v: Option<&u32>| match (k, v) {
        (Some(k), Some(v)) => format!("({k}, {v})"),
        _ => format!("<{state}>"),
    };
    let a = build().render(fmt);
    let b = build().render(fmt);
    assert_eq!(a, b);
    assert!(a.starts_with("--- HashTable - size[17] - entries[3] - loadfct[0.50] ---\n"));
    assert_eq!(a.matches("<tombstone>").count(), 1);
    assert!(a.contains("(5, 50)"));
}

#[test]
fn teardown_runs_destroyers_once_per_live_entry() {
    let mut t: HashTable<u32, Vec<u8>> = HashTable::new().unwrap();
    for k in 0..12 {
        t.insert(k, vec![k as u8; 3]).unwrap();
    }
    t.remove(&0).unwrap();

    let mut freed_keys = 0;
    let mut freed_bytes = 0;
    {
        let on_key: &mut dyn FnMut(u32) = &mut |_| freed_keys += 1;
        let on_value: &mut dyn FnMut(Vec<u8>) = &mut |v| freed_bytes += v.len();
        t.teardown(Some(on_key), Some(on_value));
    }
    assert_eq!(freed_keys, 11);
    assert_eq!(freed_bytes, 33);
}
