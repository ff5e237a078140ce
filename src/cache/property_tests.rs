//! Property-Based Tests for Cache Module
//!
//! Uses proptest against the memory backend, driving the async API with
//! `tokio_test::block_on`.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio_test::block_on;

use crate::cache::{MemoryStore, Options, Store};

// == Test Configuration ==
fn test_options() -> Options {
    Options::default().with_cleanup_interval(Duration::ZERO)
}

// == Strategies ==
/// Generates cache keys (non-empty)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(|s| s)
}

/// Generates opaque byte values
fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Generates short prefixes so that collisions with keys are common
fn prefix_strategy() -> impl Strategy<Value = String> {
    "[a-c]{0,2}".prop_map(|s| s)
}

/// A sequence of cache operations for model-based testing
#[derive(Debug, Clone)]
enum CacheOp {
    Write { key: String, value: Vec<u8> },
    Delete { key: String },
    DeleteByPrefix { prefix: String },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => ("[a-c]{1,3}", value_strategy())
            .prop_map(|(key, value)| CacheOp::Write { key, value }),
        2 => "[a-c]{1,3}".prop_map(|key| CacheOp::Delete { key }),
        1 => prefix_strategy().prop_map(|prefix| CacheOp::DeleteByPrefix { prefix }),
        1 => Just(CacheOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: a write followed by a read returns the same bytes
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in value_strategy()) {
        let store = MemoryStore::new(test_options());

        block_on(store.write(&key, value.clone())).unwrap();

        prop_assert_eq!(block_on(store.read(&key)).unwrap(), Some(value));
        prop_assert!(block_on(store.exist(&key)).unwrap());
    }

    // Overwrite: the last write wins and only one entry exists
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let store = MemoryStore::new(test_options());

        block_on(store.write(&key, value1)).unwrap();
        block_on(store.write(&key, value2.clone())).unwrap();

        prop_assert_eq!(block_on(store.read(&key)).unwrap(), Some(value2));
        prop_assert_eq!(block_on(store.len()), 1);
    }

    // Capacity: the store never holds more than max_entries after a write
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), value_strategy()), 1..200),
        max_entries in 1usize..50
    ) {
        let store = MemoryStore::new(test_options().with_max_entries(max_entries));

        for (key, value) in entries {
            block_on(store.write(&key, value)).unwrap();
            let len = block_on(store.len());
            prop_assert!(len <= max_entries, "Cache size {} exceeds max {}", len, max_entries);
        }
    }

    // FIFO: with n distinct keys written into a store of capacity c, exactly
    // the last c keys survive, whatever was overwritten in between
    #[test]
    fn prop_fifo_eviction_order(
        keys in prop::collection::vec(valid_key_strategy(), 2..30),
        capacity in 1usize..10
    ) {
        let mut seen = HashSet::new();
        let unique: Vec<String> = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        let store = MemoryStore::new(test_options().with_max_entries(capacity));

        for key in &unique {
            block_on(store.write(key, key.as_bytes().to_vec())).unwrap();
        }

        let survivors = unique.len().min(capacity);
        let cut = unique.len() - survivors;
        for (i, key) in unique.iter().enumerate() {
            let readable = block_on(store.exist(key)).unwrap();
            prop_assert_eq!(readable, i >= cut, "key {} at position {}", key, i);
        }
    }

    // Prefix delete: exactly the matching keys go, and the count agrees
    #[test]
    fn prop_delete_by_prefix(
        keys in prop::collection::hash_set("[a-c]{1,4}", 0..20),
        prefix in prefix_strategy()
    ) {
        let store = MemoryStore::new(test_options());
        for key in &keys {
            block_on(store.write(key, vec![1])).unwrap();
        }

        let expected = keys.iter().filter(|k| k.starts_with(&prefix)).count() as u64;
        prop_assert_eq!(block_on(store.delete_by_prefix(&prefix)).unwrap(), expected);

        for key in &keys {
            prop_assert_eq!(block_on(store.exist(key)).unwrap(), !key.starts_with(&prefix));
        }
    }

    // Model check: an unbounded store behaves like a HashMap
    #[test]
    fn prop_matches_hashmap_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let store = MemoryStore::new(test_options());
        let mut model: HashMap<String, Vec<u8>> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Write { key, value } => {
                    block_on(store.write(&key, value.clone())).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Delete { key } => {
                    block_on(store.delete(&key)).unwrap();
                    model.remove(&key);
                }
                CacheOp::DeleteByPrefix { prefix } => {
                    let removed = block_on(store.delete_by_prefix(&prefix)).unwrap();
                    let before = model.len();
                    model.retain(|k, _| !k.starts_with(&prefix));
                    prop_assert_eq!(removed, (before - model.len()) as u64);
                }
                CacheOp::Clear => {
                    block_on(store.clear()).unwrap();
                    model.clear();
                }
            }
        }

        let stats = block_on(store.stats()).unwrap();
        prop_assert_eq!(stats.entries, model.len() as u64);
        for (key, value) in &model {
            let stored = block_on(store.read(key)).unwrap();
            prop_assert_eq!(stored.as_ref(), Some(value));
        }
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Expiry: entries vanish from reads after their TTL, with no sweep
    #[test]
    fn prop_ttl_expiration_behavior(key in valid_key_strategy(), value in value_strategy()) {
        let store = MemoryStore::new(test_options());

        block_on(store.write_with_ttl(&key, value.clone(), Duration::from_millis(30))).unwrap();
        prop_assert_eq!(block_on(store.read(&key)).unwrap(), Some(value));

        std::thread::sleep(Duration::from_millis(50));

        prop_assert_eq!(block_on(store.read(&key)).unwrap(), None);
        prop_assert!(!block_on(store.exist(&key)).unwrap());
    }
}
