//! # Limiter statistics.
//!
//! Counters grow monotonically; averages are incremental means
//! (`mean += (x - mean) / n`) updated on every settlement, so no sample buffers are kept.

use std::time::Duration;

/// Snapshot returned by [`RateLimiter::stats`](crate::RateLimiter::stats).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateLimiterStats {
    /// Tasks whose work succeeded.
    pub total_processed: u64,
    /// Tasks whose work returned an error or panicked.
    pub total_failed: u64,
    /// Tasks that timed out, queued or running.
    pub total_timeout: u64,
    /// Tasks cancelled, queued or running.
    pub total_cancelled: u64,
    /// Queued tasks rejected because the limiter stopped.
    pub total_rejected: u64,
    /// Mean execution time of tasks that started.
    pub avg_execution_time: Duration,
    /// Mean time spent queued.
    pub avg_wait_time: Duration,
    /// Tasks currently queued.
    pub queue_size: usize,
    /// Tasks currently running (started, not yet settled).
    pub processing: usize,
    /// Starts inside the current window.
    pub window_usage: usize,
}

/// How a task left the limiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Outcome {
    Completed,
    Failed,
    Timeout,
    Cancelled,
    Rejected,
}

#[derive(Clone, Copy, Debug, Default)]
struct RunningMean {
    count: u64,
    mean_secs: f64,
}

impl RunningMean {
    fn push(&mut self, sample: Duration) {
        self.count += 1;
        self.mean_secs += (sample.as_secs_f64() - self.mean_secs) / self.count as f64;
    }

    fn get(&self) -> Duration {
        Duration::try_from_secs_f64(self.mean_secs.max(0.0)).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub(super) struct StatsCollector {
    processed: u64,
    failed: u64,
    timeout: u64,
    cancelled: u64,
    rejected: u64,
    execution: RunningMean,
    wait: RunningMean,
}

impl StatsCollector {
    /// Records one settlement.
    ///
    /// `wait` is the time spent queued; `execution` is `None` for tasks that never started.
    pub fn record(&mut self, outcome: Outcome, wait: Duration, execution: Option<Duration>) {
        match outcome {
            Outcome::Completed => self.processed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Timeout => self.timeout += 1,
            Outcome::Cancelled => self.cancelled += 1,
            Outcome::Rejected => self.rejected += 1,
        }
        self.wait.push(wait);
        if let Some(execution) = execution {
            self.execution.push(execution);
        }
    }

    pub fn snapshot(&self, queue_size: usize, processing: usize, window_usage: usize) -> RateLimiterStats {
        RateLimiterStats {
            total_processed: self.processed,
            total_failed: self.failed,
            total_timeout: self.timeout,
            total_cancelled: self.cancelled,
            total_rejected: self.rejected,
            avg_execution_time: self.execution.get(),
            avg_wait_time: self.wait.get(),
            queue_size,
            processing,
            window_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        let diff = actual.abs_diff(expected);
        assert!(diff < Duration::from_micros(10), "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_incremental_mean() {
        let mut s = StatsCollector::default();
        s.record(Outcome::Completed, Duration::from_millis(0), Some(Duration::from_millis(100)));
        s.record(Outcome::Completed, Duration::from_millis(200), Some(Duration::from_millis(300)));
        s.record(Outcome::Failed, Duration::from_millis(400), Some(Duration::from_millis(500)));

        let snap = s.snapshot(0, 0, 0);
        assert_eq!(snap.total_processed, 2);
        assert_eq!(snap.total_failed, 1);
        assert_close(snap.avg_wait_time, 200);
        assert_close(snap.avg_execution_time, 300);
    }

    #[test]
    fn test_unstarted_tasks_do_not_touch_execution_mean() {
        let mut s = StatsCollector::default();
        s.record(Outcome::Completed, Duration::ZERO, Some(Duration::from_millis(50)));
        s.record(Outcome::Cancelled, Duration::from_millis(10), None);
        s.record(Outcome::Rejected, Duration::from_millis(20), None);

        let snap = s.snapshot(3, 1, 2);
        assert_eq!(snap.total_cancelled, 1);
        assert_eq!(snap.total_rejected, 1);
        assert_close(snap.avg_execution_time, 50);
        assert_close(snap.avg_wait_time, 10);
        assert_eq!((snap.queue_size, snap.processing, snap.window_usage), (3, 1, 2));
    }
}
