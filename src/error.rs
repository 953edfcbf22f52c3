//! Error types used by the rate limiter and the tasks it runs.
//!
//! This module defines three error enums:
//!
//! - [`AdmissionError`]: synchronous rejections returned by
//!   [`RateLimiter::enqueue`](crate::RateLimiter::enqueue); the task never enters the queue.
//! - [`LimiterError`]: the outcome of an accepted task that did not succeed.
//! - [`ConfigError`]: invalid [`RateLimiterConfig`](crate::RateLimiterConfig) values.
//!
//! All of them provide `as_label` for logs/metrics; [`LimiterError::is_retryable`]
//! tells callers whether backing off and resubmitting makes sense.

use std::time::Duration;
use thiserror::Error;

/// # Immediate admission failures.
///
/// Returned synchronously by `enqueue`: the task was **not** queued and its work never runs.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The queue already holds `max_queue_size` tasks (caller should back off or shed load).
    #[error("queue full (capacity {capacity})")]
    QueueFull {
        /// The configured queue capacity.
        capacity: usize,
    },

    /// The limiter is draining or stopped (caller should stop submitting).
    #[error("rate limiter stopped")]
    Stopped,

    /// Another queued or running task already uses this id.
    #[error("task id '{id}' is already queued or running")]
    DuplicateId {
        /// The colliding task id.
        id: String,
    },
}

impl AdmissionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ratevisor::AdmissionError;
    ///
    /// let err = AdmissionError::QueueFull { capacity: 10 };
    /// assert_eq!(err.as_label(), "queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionError::QueueFull { .. } => "queue_full",
            AdmissionError::Stopped => "limiter_stopped",
            AdmissionError::DuplicateId { .. } => "duplicate_id",
        }
    }
}

/// # Errors produced by an accepted task.
///
/// `E` is the error type of the task's own work; it is passed through unchanged
/// in [`LimiterError::Failed`]. Every other variant is raised by the limiter itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LimiterError<E> {
    /// Queue was full at submission time.
    #[error("queue full (capacity {capacity})")]
    QueueFull {
        /// The configured queue capacity.
        capacity: usize,
    },

    /// Limiter was stopped at submission time, or while the task was still queued.
    #[error("rate limiter stopped")]
    Stopped,

    /// Task id collided with a queued or running task.
    #[error("task id '{id}' is already queued or running")]
    DuplicateId {
        /// The colliding task id.
        id: String,
    },

    /// Task was not started, or did not finish, within its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task was cancelled by id, by `cancel_all`, or through its external signal.
    #[error("task cancelled")]
    Cancelled,

    /// Task's work panicked; the panic was contained in its own tokio task.
    #[error("task panicked: {reason}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        reason: String,
    },

    /// Task's work returned an error.
    #[error("task failed: {0}")]
    Failed(E),
}

impl<E> LimiterError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ratevisor::LimiterError;
    /// use std::time::Duration;
    ///
    /// let err: LimiterError<std::io::Error> = LimiterError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LimiterError::QueueFull { .. } => "queue_full",
            LimiterError::Stopped => "limiter_stopped",
            LimiterError::DuplicateId { .. } => "duplicate_id",
            LimiterError::Timeout { .. } => "task_timeout",
            LimiterError::Cancelled => "task_cancelled",
            LimiterError::Panicked { .. } => "task_panicked",
            LimiterError::Failed(_) => "task_failed",
        }
    }

    /// Indicates whether resubmitting (with backoff) may succeed.
    ///
    /// Returns `true` for [`LimiterError::QueueFull`] and [`LimiterError::Timeout`].
    /// Cancellation and shutdown are intentional and never retryable; whether the
    /// work's own failure is retryable is for the caller to decide, so `Failed`
    /// and `Panicked` return `false`.
    ///
    /// # Example
    /// ```
    /// use ratevisor::LimiterError;
    ///
    /// let full: LimiterError<String> = LimiterError::QueueFull { capacity: 1 };
    /// assert!(full.is_retryable());
    ///
    /// let cancelled: LimiterError<String> = LimiterError::Cancelled;
    /// assert!(!cancelled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LimiterError::QueueFull { .. } | LimiterError::Timeout { .. }
        )
    }

    /// Returns the work's own error, if that is what this is.
    pub fn into_failed(self) -> Option<E> {
        match self {
            LimiterError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<AdmissionError> for LimiterError<E> {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::QueueFull { capacity } => LimiterError::QueueFull { capacity },
            AdmissionError::Stopped => LimiterError::Stopped,
            AdmissionError::DuplicateId { id } => LimiterError::DuplicateId { id },
        }
    }
}

/// Rejection applied by the limiter to a task it settles without a result.
///
/// Type-erased counterpart of the limiter-raised [`LimiterError`] variants,
/// so that queued tasks of different `T`/`E` can share one queue.
#[derive(Debug, Clone)]
pub(crate) enum Rejection {
    Timeout(Duration),
    Cancelled,
    Stopped,
}

impl<E> From<Rejection> for LimiterError<E> {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Timeout(timeout) => LimiterError::Timeout { timeout },
            Rejection::Cancelled => LimiterError::Cancelled,
            Rejection::Stopped => LimiterError::Stopped,
        }
    }
}

/// # Invalid limiter configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_requests` must be greater than zero.
    #[error("max_requests must be > 0")]
    ZeroMaxRequests,

    /// `window` must be longer than zero.
    #[error("window must be > 0")]
    ZeroWindow,

    /// `window` is longer than the limiter can schedule against.
    #[error("window must be at most {max:?}")]
    WindowTooLarge { max: Duration },

    /// `name` must not be empty (it tags every event and log line).
    #[error("limiter name must not be empty")]
    EmptyName,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroMaxRequests => "config_zero_max_requests",
            ConfigError::ZeroWindow => "config_zero_window",
            ConfigError::WindowTooLarge { .. } => "config_window_too_large",
            ConfigError::EmptyName => "config_empty_name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_error_converts_into_limiter_error() {
        let err: LimiterError<String> = AdmissionError::QueueFull { capacity: 3 }.into();
        assert!(matches!(err, LimiterError::QueueFull { capacity: 3 }));

        let err: LimiterError<String> = AdmissionError::DuplicateId { id: "a".into() }.into();
        assert_eq!(err.as_label(), "duplicate_id");
        assert_eq!(err.to_string(), "task id 'a' is already queued or running");
    }

    #[test]
    fn test_retryable_kinds() {
        let timeout: LimiterError<String> = LimiterError::Timeout {
            timeout: Duration::from_millis(100),
        };
        assert!(timeout.is_retryable());
        assert!(!LimiterError::<String>::Stopped.is_retryable());
        assert!(!LimiterError::Failed("boom".to_string()).is_retryable());
    }

    #[test]
    fn test_failed_passes_work_error_through() {
        let err = LimiterError::Failed(std::io::Error::other("disk"));
        assert_eq!(err.to_string(), "task failed: disk");
        let inner = err.into_failed().map(|e| e.kind());
        assert_eq!(inner, Some(std::io::ErrorKind::Other));
    }

    #[test]
    fn test_rejection_maps_to_limiter_kinds() {
        let err: LimiterError<String> = Rejection::Timeout(Duration::from_secs(2)).into();
        assert_eq!(err.as_label(), "task_timeout");
        let err: LimiterError<String> = Rejection::Stopped.into();
        assert_eq!(err.to_string(), "rate limiter stopped");
    }
}
