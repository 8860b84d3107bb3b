//! Fixed-capacity FIFO sequence.
//!
//! Every retained collection in the history (per-test entries, run summaries,
//! run metadata) goes through [`BoundedSeq`]. Appending past capacity evicts
//! from the front, and the evicted items are handed back so callers can clean
//! up anything attached to them (run snapshot files).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// Ordered sequence holding at most `capacity` items, oldest first.
///
/// Serialized as a plain JSON array. A decoded sequence carries no capacity
/// (it is unbounded) until [`BoundedSeq::rebound`] applies one.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSeq<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedSeq<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `item` and returns whatever fell off the front.
    pub fn push(&mut self, item: T) -> Vec<T> {
        self.items.push_back(item);
        self.evict()
    }

    /// Applies a new capacity, evicting the oldest items that no longer fit.
    pub fn rebound(&mut self, capacity: usize) -> Vec<T> {
        self.capacity = capacity;
        self.evict()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }

    fn evict(&mut self) -> Vec<T> {
        let excess = self.items.len().saturating_sub(self.capacity);
        self.items.drain(..excess).collect()
    }
}

impl<T> Default for BoundedSeq<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> FromIterator<T> for BoundedSeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            capacity: usize::MAX,
        }
    }
}

impl<'a, T> IntoIterator for &'a BoundedSeq<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for BoundedSeq<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for BoundedSeq<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
