//! # Queue ordering policy
//!
//! Decides which queued task is admitted next when the window has a free slot.
//!
//! ## Variants
//! - `Fifo`: strictly in submission order; per-task priorities are ignored.
//! - `Priority`: highest priority first; equal priorities in submission order.
//!
//! ## Invariants
//! - The choice is deterministic given the queue contents (ties broken by a
//!   monotonic submission sequence, never by wall-clock readings).
//! - Ordering governs **start** order only; completion order depends on the work.

/// Policy controlling which queued task starts next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueueOrder {
    /// Start tasks in submission order.
    ///
    /// Use when:
    /// - All callers are equal
    /// - Example: outbound notifications
    #[default]
    Fifo,

    /// Start the highest-priority task first.
    ///
    /// Use when:
    /// - Some callers are latency-sensitive
    /// - Example: user-facing replies ahead of background sync writes
    Priority,
}

impl QueueOrder {
    /// Builds the policy from a `fifo` flag.
    #[inline]
    pub fn from_fifo(fifo: bool) -> Self {
        if fifo { Self::Fifo } else { Self::Priority }
    }

    /// True for [`QueueOrder::Fifo`].
    #[inline]
    pub fn is_fifo(self) -> bool {
        matches!(self, Self::Fifo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fifo_flag() {
        assert_eq!(QueueOrder::from_fifo(true), QueueOrder::Fifo);
        assert_eq!(QueueOrder::from_fifo(false), QueueOrder::Priority);
        assert!(QueueOrder::from_fifo(true).is_fifo());
        assert!(!QueueOrder::from_fifo(false).is_fifo());
        assert_eq!(QueueOrder::default(), QueueOrder::Fifo);
    }
}
