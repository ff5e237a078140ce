//! FIFO Order Module
//!
//! Tracks insertion order of keys for first-in-first-out eviction.

use std::collections::{BTreeMap, HashMap};

// == FIFO Order ==
/// Insertion-order tracker used by the memory backend.
///
/// Every tracked key carries an ever-increasing insertion number:
/// - Lowest number = Oldest insertion (next eviction candidate)
/// - Highest number = Newest insertion
///
/// Unlike an LRU tracker, re-inserting a tracked key does not move it.
/// Removing a single key costs O(log n).
#[derive(Debug, Default)]
pub struct FifoOrder {
    by_seq: BTreeMap<u64, String>,
    seq_of: HashMap<String, u64>,
    next_seq: u64,
}

impl FifoOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Appends a key at the back. A key that is already tracked stays put.
    pub fn push(&mut self, key: &str) {
        if self.seq_of.contains_key(key) {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_seq.insert(seq, key.to_string());
        self.seq_of.insert(key.to_string(), seq);
    }

    // == Move To Back ==
    /// Moves a key to the back, as if freshly inserted.
    pub fn move_to_back(&mut self, key: &str) {
        self.remove(key);
        self.push(key);
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.seq_of.remove(key) {
            self.by_seq.remove(&seq);
        }
    }

    // == Retain ==
    /// Keeps only the keys matching the predicate.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let seq_of = &mut self.seq_of;
        self.by_seq.retain(|_, key| {
            let kept = keep(key);
            if !kept {
                seq_of.remove(key.as_str());
            }
            kept
        });
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key, None if empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_seq.pop_first()?;
        self.seq_of.remove(&key);
        Some(key)
    }

    /// Returns the oldest key without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.by_seq.values().next()
    }

    // == Clear ==
    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.seq_of.clear();
    }

    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.seq_of.contains_key(key)
    }
}
