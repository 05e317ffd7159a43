//! Insertion Order Module
//!
//! Tracks the order keys were written in, for oldest-insertion eviction.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks write order for the eviction strategy.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently written
/// - Back = Oldest write (next eviction candidate)
///
/// Reads never reorder keys; only writes do.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as freshly written (moves to front).
    pub fn record_write(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest written key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    /// Returns the oldest written key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.back().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
