use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::core::Shared;
use super::handle::Reject;

/// Lifecycle state of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterState {
    /// Accepting submissions and starting tasks.
    Running,

    /// `stop()` in progress: submissions refused, running tasks being awaited.
    Draining,

    /// Not accepting submissions; `start()` resumes.
    Stopped,
}

/// Starts a task's work on the runtime. Captures the typed work and settler.
pub(super) type Launch = Box<dyn FnOnce(Arc<Shared>, Started) + Send>;

/// A task waiting for a window slot.
pub(super) struct QueuedTask {
    pub priority: i32,
    pub enqueued_at: Instant,
    pub timeout: Option<Duration>,

    /// Cooperative token handed to the work; cancelled once the task is settled.
    pub token: CancellationToken,
    pub reject: Arc<dyn Reject>,
    pub launch: Launch,
}

/// A task admitted by the window and not yet settled.
pub(super) struct RunningTask {
    pub enqueued_at: Instant,
    pub started_at: Instant,
    pub token: CancellationToken,
    pub reject: Arc<dyn Reject>,
}

/// What a launched task needs to know about its own admission.
pub(super) struct Started {
    pub id: Arc<str>,
    pub started_at: Instant,
    pub timeout: Option<Duration>,
    pub token: CancellationToken,
}

impl RunningTask {
    /// Time spent queued.
    pub fn waited(&self) -> Duration {
        self.started_at.saturating_duration_since(self.enqueued_at)
    }
}
