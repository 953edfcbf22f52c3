use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Per-submission options for [`RateLimiter::enqueue`](crate::RateLimiter::enqueue).
///
/// Every field is optional; `TaskOptions::default()` queues the task with
/// priority 0, a generated id, the limiter's default timeout and no external signal.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use ratevisor::TaskOptions;
///
/// let shutdown = CancellationToken::new();
/// let opts = TaskOptions::new()
///     .with_id("guild-42-sync")
///     .with_priority(5)
///     .with_timeout(Duration::from_secs(10))
///     .with_signal(shutdown.child_token());
///
/// assert_eq!(opts.priority, 5);
/// assert_eq!(opts.id.as_deref(), Some("guild-42-sync"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TaskOptions {
    /// Ordering priority (higher starts first in priority mode).
    pub priority: i32,

    /// Caller-chosen id; must not collide with a queued or running task.
    pub id: Option<String>,

    /// Timeout override.
    ///
    /// - `None` → the limiter's `task_timeout`
    /// - `Some(Duration::ZERO)` → no timeout for this task
    pub timeout: Option<Duration>,

    /// External cancellation source; firing it is equivalent to `cancel(id)`.
    pub signal: Option<CancellationToken>,
}

impl TaskOptions {
    /// Creates default options.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the limiter's default timeout (`Duration::ZERO` disables it).
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Resolves the effective timeout against the limiter's default.
    pub(super) fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        match self.timeout {
            Some(t) if t.is_zero() => None,
            Some(t) => Some(t),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_timeout() {
        let default = Some(Duration::from_secs(30));
        assert_eq!(TaskOptions::new().effective_timeout(default), default);
        assert_eq!(TaskOptions::new().effective_timeout(None), None);

        let opts = TaskOptions::new().with_timeout(Duration::from_millis(100));
        assert_eq!(opts.effective_timeout(default), Some(Duration::from_millis(100)));

        let opts = TaskOptions::new().with_timeout(Duration::ZERO);
        assert_eq!(opts.effective_timeout(default), None);
    }
}
