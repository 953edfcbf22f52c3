//! # LogWriter: events as `tracing` records
//!
//! A subscriber that renders incoming [`Event`]s through [`tracing`] with
//! structured fields, so limiter activity ends up wherever the host application
//! routes its logs.
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG ratevisor: task queued limiter="discord-api" task="task-3" priority=0
//! DEBUG ratevisor: task starting limiter="discord-api" task="task-3" waited_ms=412
//!  WARN ratevisor: task timed out limiter="discord-api" task="task-3" timeout_ms=5000 phase="running"
//!  INFO ratevisor: rate limiter stopped limiter="discord-api"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let limiter = e.limiter.as_deref().unwrap_or("-");
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskQueued => {
                debug!(target: "ratevisor", limiter, task, priority = ?e.priority, timeout_ms = ?e.timeout_ms, "task queued");
            }
            EventKind::QueueFull => {
                warn!(target: "ratevisor", limiter, reason, "queue full, submission refused");
            }
            EventKind::TaskStarting => {
                debug!(target: "ratevisor", limiter, task, priority = ?e.priority, waited_ms = ?e.delay_ms, "task starting");
            }
            EventKind::TaskCompleted => {
                debug!(target: "ratevisor", limiter, task, elapsed_ms = ?e.elapsed_ms, "task completed");
            }
            EventKind::TaskFailed => {
                warn!(target: "ratevisor", limiter, task, err = reason, elapsed_ms = ?e.elapsed_ms, "task failed");
            }
            EventKind::TimeoutHit => {
                warn!(target: "ratevisor", limiter, task, timeout_ms = ?e.timeout_ms, phase = reason, "task timed out");
            }
            EventKind::TaskCancelled => {
                info!(target: "ratevisor", limiter, task, phase = reason, "task cancelled");
            }
            EventKind::TaskRejected => {
                info!(target: "ratevisor", limiter, task, "queued task rejected: limiter stopping");
            }
            EventKind::WindowSaturated => {
                debug!(target: "ratevisor", limiter, next_slot_ms = ?e.delay_ms, "window saturated");
            }
            EventKind::LimiterStarted => {
                info!(target: "ratevisor", limiter, "rate limiter started");
            }
            EventKind::DrainRequested => {
                info!(target: "ratevisor", limiter, "rate limiter draining");
            }
            EventKind::LimiterStopped => {
                info!(target: "ratevisor", limiter, "rate limiter stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "ratevisor", subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "ratevisor", subscriber = task, panic_info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
