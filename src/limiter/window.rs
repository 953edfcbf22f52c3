//! # Rolling window of task starts.
//!
//! Records the instant of every admitted start. A start at `ts` counts against the
//! budget while `now - ts < window`; older entries are purged lazily when the
//! dispatcher asks for the next free slot, never by a background sweep.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Stand-in for a free slot that lies past the clock's range.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `at + d`, clamped instead of overflowing.
fn saturating_add(at: Instant, d: Duration) -> Instant {
    at.checked_add(d)
        .or_else(|| at.checked_add(FAR_FUTURE))
        .unwrap_or(at)
}

pub(super) struct WindowTracker {
    window: Duration,
    starts: VecDeque<Instant>,
}

impl WindowTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            starts: VecDeque::new(),
        }
    }

    /// Drops starts that left the window.
    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.starts.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.starts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns `None` if a start is allowed at `now`, otherwise the instant the
    /// next slot frees up.
    pub fn next_slot(&mut self, now: Instant, max_requests: usize) -> Option<Instant> {
        self.purge(now);
        let len = self.starts.len();
        if len < max_requests {
            return None;
        }
        self.starts
            .get(len - max_requests)
            .map(|oldest| saturating_add(*oldest, self.window))
    }

    /// Records an admitted start.
    pub fn record(&mut self, now: Instant) {
        self.starts.push_back(now);
    }

    /// Number of starts inside the window ending at `now`.
    pub fn admitted(&self, now: Instant) -> usize {
        self.starts
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: Duration = Duration::from_millis(1000);

    #[test]
    fn test_allows_until_budget_spent() {
        let t0 = Instant::now();
        let mut w = WindowTracker::new(W);
        assert_eq!(w.next_slot(t0, 2), None);
        w.record(t0);
        assert_eq!(w.next_slot(t0, 2), None);
        w.record(t0 + Duration::from_millis(100));
        assert_eq!(w.next_slot(t0 + Duration::from_millis(100), 2), Some(t0 + W));
    }

    #[test]
    fn test_entry_expires_exactly_at_window_edge() {
        let t0 = Instant::now();
        let mut w = WindowTracker::new(W);
        w.record(t0);
        assert_eq!(w.next_slot(t0 + Duration::from_millis(999), 1), Some(t0 + W));
        assert_eq!(w.next_slot(t0 + W, 1), None);
        assert_eq!(w.admitted(t0 + W), 0);
    }

    #[test]
    fn test_admitted_counts_only_trailing_window() {
        let t0 = Instant::now();
        let mut w = WindowTracker::new(W);
        for ms in [0, 400, 800, 1200] {
            w.record(t0 + Duration::from_millis(ms));
        }
        assert_eq!(w.admitted(t0 + Duration::from_millis(1200)), 3);
        assert_eq!(w.admitted(t0 + Duration::from_millis(2100)), 1);
    }

    #[test]
    fn test_next_slot_uses_oldest_counted_entry() {
        let t0 = Instant::now();
        let mut w = WindowTracker::new(W);
        w.record(t0);
        w.record(t0 + Duration::from_millis(300));
        w.record(t0 + Duration::from_millis(600));
        // Budget of 2 with 3 entries: the slot frees once the second-oldest leaves.
        let now = t0 + Duration::from_millis(700);
        assert_eq!(w.next_slot(now, 2), Some(t0 + Duration::from_millis(1300)));
    }

    #[test]
    fn test_unrepresentable_window_end_is_clamped() {
        let t0 = Instant::now();
        let mut w = WindowTracker::new(Duration::MAX);
        w.record(t0);
        let free_at = w.next_slot(t0 + Duration::from_secs(3600), 1);
        assert_eq!(free_at, Some(t0 + FAR_FUTURE));
        assert_eq!(w.admitted(t0 + Duration::from_secs(3600)), 1);
    }
}
