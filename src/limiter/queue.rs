//! # Pending-task queue with id index.
//!
//! One ordered structure serves both ordering modes: a `BTreeMap` keyed by
//! `(rank, seq)`, where `rank` is the negated priority in priority mode and a
//! constant in FIFO mode. A side index maps task ids to keys, so removal by id
//! (cancel, queue timeout) is `O(log n)`.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::order::QueueOrder;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    rank: Reverse<i32>,
    seq: u64,
}

/// Ordered collection of queued entries, addressable by task id.
pub(super) struct TaskQueue<V> {
    order: QueueOrder,
    entries: BTreeMap<QueueKey, (Arc<str>, V)>,
    index: HashMap<Arc<str>, QueueKey>,
}

impl<V> TaskQueue<V> {
    pub fn new(order: QueueOrder) -> Self {
        Self {
            order,
            entries: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts an entry. `seq` must be unique and increasing across pushes.
    ///
    /// Returns `false` (and drops nothing) if `id` is already queued.
    pub fn push(&mut self, id: Arc<str>, priority: i32, seq: u64, value: V) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let rank = match self.order {
            QueueOrder::Fifo => Reverse(0),
            QueueOrder::Priority => Reverse(priority),
        };
        let key = QueueKey { rank, seq };
        self.index.insert(Arc::clone(&id), key);
        self.entries.insert(key, (id, value));
        true
    }

    /// Removes and returns the next entry to start.
    pub fn pop(&mut self) -> Option<(Arc<str>, V)> {
        let (_, (id, value)) = self.entries.pop_first()?;
        self.index.remove(&id);
        Some((id, value))
    }

    /// Removes the entry with the given id.
    pub fn remove(&mut self, id: &str) -> Option<V> {
        let key = self.index.remove(id)?;
        self.entries.remove(&key).map(|(_, v)| v)
    }

    /// Removes every entry, in start order.
    pub fn drain(&mut self) -> Vec<(Arc<str>, V)> {
        self.index.clear();
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<V>(q: &mut TaskQueue<V>) -> Vec<String> {
        std::iter::from_fn(|| q.pop().map(|(id, _)| id.to_string())).collect()
    }

    #[test]
    fn test_fifo_ignores_priority() {
        let mut q = TaskQueue::new(QueueOrder::Fifo);
        q.push("a".into(), 1, 0, ());
        q.push("b".into(), 5, 1, ());
        q.push("c".into(), -3, 2, ());
        assert_eq!(ids(&mut q), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_priority_highest_first_ties_by_seq() {
        let mut q = TaskQueue::new(QueueOrder::Priority);
        q.push("low".into(), 1, 0, ());
        q.push("high-1".into(), 5, 1, ());
        q.push("mid".into(), 3, 2, ());
        q.push("high-2".into(), 5, 3, ());
        assert_eq!(ids(&mut q), vec!["high-1", "high-2", "mid", "low"]);
    }

    #[test]
    fn test_remove_by_id_keeps_order_of_rest() {
        let mut q = TaskQueue::new(QueueOrder::Fifo);
        for (seq, id) in ["a", "b", "c"].into_iter().enumerate() {
            q.push(id.into(), 0, seq as u64, id);
        }
        assert_eq!(q.remove("b"), Some("b"));
        assert_eq!(q.remove("b"), None);
        assert!(!q.contains("b"));
        assert_eq!(q.len(), 2);
        assert_eq!(ids(&mut q), vec!["a", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_duplicate_id_is_refused() {
        let mut q = TaskQueue::new(QueueOrder::Fifo);
        assert!(q.push("a".into(), 0, 0, 1));
        assert!(!q.push("a".into(), 0, 1, 2));
        assert_eq!(q.len(), 1);
        assert_eq!(q.remove("a"), Some(1));
    }

    #[test]
    fn test_drain_returns_start_order_and_clears_index() {
        let mut q = TaskQueue::new(QueueOrder::Priority);
        q.push("a".into(), 0, 0, ());
        q.push("b".into(), 9, 1, ());
        let drained: Vec<String> = q.drain().into_iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(drained, vec!["b", "a"]);
        assert!(!q.contains("a"));
        assert!(q.is_empty());
    }
}
