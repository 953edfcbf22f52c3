//! # Events emitted by a rate limiter.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: a task was queued or refused at the door
//! - **Task events**: start, completion, failure, timeout, cancellation, rejection
//! - **Lifecycle events**: limiter started, drain requested, limiter stopped
//! - **Subscriber events**: a subscriber panicked or fell behind
//!
//! The [`Event`] struct carries metadata such as timestamps, limiter name, task id
//! and durations. Fields that do not apply to a kind are `None`.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use ratevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_limiter("discord-api")
//!     .with_task("task-7")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.task.as_deref(), Some("task-7"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of limiter events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// Task accepted into the queue.
    ///
    /// Sets: `task`, `priority`, `timeout_ms` (if any)
    TaskQueued,

    /// Submission refused because the queue is at capacity.
    ///
    /// Sets: `reason` (capacity)
    QueueFull,

    // === Task events ===
    /// Task admitted by the window and launched.
    ///
    /// Sets: `task`, `priority`, `delay_ms` (time spent queued)
    TaskStarting,

    /// Task's work finished successfully.
    ///
    /// Sets: `task`, `elapsed_ms` (execution time)
    TaskCompleted,

    /// Task's work returned an error or panicked.
    ///
    /// Sets: `task`, `reason`, `elapsed_ms`
    TaskFailed,

    /// Task exceeded its timeout, either still queued or while running.
    ///
    /// Sets: `task`, `timeout_ms`, `reason` (`"queued"` or `"running"`)
    TimeoutHit,

    /// Task cancelled by id, by `cancel_all`, or through its external signal.
    ///
    /// Sets: `task`, `reason` (`"queued"` or `"running"`)
    TaskCancelled,

    /// Queued task rejected because the limiter is stopping.
    ///
    /// Sets: `task`
    TaskRejected,

    /// Window budget exhausted; dispatcher sleeps until the oldest start expires.
    ///
    /// Sets: `delay_ms` (time until the next slot)
    WindowSaturated,

    // === Lifecycle events ===
    /// Limiter entered the running state (on build and on `start()`).
    LimiterStarted,

    /// `stop()` called; queued tasks are rejected, running tasks are awaited.
    DrainRequested,

    /// All running tasks settled after `stop()`.
    LimiterStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic info)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Limiter event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the limiter that emitted the event.
    pub limiter: Option<Arc<str>>,
    /// Task id, if applicable.
    pub task: Option<Arc<str>>,
    /// Task priority, if applicable.
    pub priority: Option<i32>,
    /// Human-readable reason (errors, phase, overflow details).
    pub reason: Option<Arc<str>>,
    /// Task timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Waiting time in milliseconds (queue wait, or time until next window slot).
    pub delay_ms: Option<u32>,
    /// Execution time in milliseconds.
    pub elapsed_ms: Option<u32>,
}

#[inline]
fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            limiter: None,
            task: None,
            priority: None,
            reason: None,
            timeout_ms: None,
            delay_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches the limiter name.
    #[inline]
    pub fn with_limiter(mut self, limiter: impl Into<Arc<str>>) -> Self {
        self.limiter = Some(limiter.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a waiting delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an execution time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskQueued);
        let b = Event::new(EventKind::TaskStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_saturate_to_u32() {
        let ev = Event::new(EventKind::WindowSaturated).with_delay(Duration::from_secs(u64::MAX / 4));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_overflow_is_subscriber_event() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
