//! # Rate limiter configuration.
//!
//! Provides [`RateLimiterConfig`], the settings of one limiter instance.
//!
//! Config is used in two ways:
//! 1. **Limiter creation**: `RateLimiter::builder(config).build()` (validated there)
//! 2. **Presets**: [`Preset::config`](crate::Preset::config) returns ready-made values
//!
//! ## Sentinel values
//! - `max_queue_size = 0` → unlimited queue (no backpressure)
//! - `task_timeout = 0s` → no default timeout (treated as `None` by [`RateLimiterConfig::default_timeout`])

use std::borrow::Cow;
use std::time::Duration;

use crate::error::ConfigError;
use crate::limiter::QueueOrder;

/// Configuration for a single rate limiter.
///
/// Defines:
/// - **Admission budget**: at most `max_requests` task starts within any trailing `window`
/// - **Backpressure**: queue capacity before `enqueue` fails with `QueueFull`
/// - **Task defaults**: timeout applied when a task carries no override
/// - **Ordering**: FIFO or priority
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `name`: Log/event correlation only
/// - `max_requests`: Starts allowed per window (must be `> 0`)
/// - `window`: Rolling window length (must be `> 0` and at most [`RateLimiterConfig::MAX_WINDOW`])
/// - `max_queue_size`: Queue capacity (`0` = unlimited)
/// - `task_timeout`: Default per-task timeout (`0s` = no timeout)
/// - `order`: [`QueueOrder::Fifo`] (default) or [`QueueOrder::Priority`]
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    /// Limiter name attached to every event.
    pub name: Cow<'static, str>,

    /// Maximum number of task starts within any trailing `window`.
    ///
    /// Bounds the **start rate**, not the number of tasks in flight.
    pub max_requests: usize,

    /// Length of the rolling window.
    pub window: Duration,

    /// Maximum number of queued (not yet started) tasks.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = `enqueue` fails with `QueueFull` once `n` tasks are queued
    pub max_queue_size: usize,

    /// Default task timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = applied both to the wait in the queue and to execution
    ///
    /// Can be overridden per task.
    pub task_timeout: Duration,

    /// Queue ordering policy.
    pub order: QueueOrder,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl RateLimiterConfig {
    /// Creates a config with the given budget and defaults for everything else.
    pub fn new(name: impl Into<Cow<'static, str>>, max_requests: usize, window: Duration) -> Self {
        Self {
            name: name.into(),
            max_requests,
            window,
            max_queue_size: 0,
            task_timeout: Duration::ZERO,
            order: QueueOrder::Fifo,
            bus_capacity: 1024,
        }
    }

    /// Returns a new config with updated queue capacity (`0` = unlimited).
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Returns a new config with updated default timeout (`0s` = none).
    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Returns a new config with updated ordering policy.
    pub fn with_order(mut self, order: QueueOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns a new config with updated name.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns a new config with updated bus capacity.
    pub fn with_bus_capacity(mut self, bus_capacity: usize) -> Self {
        self.bus_capacity = bus_capacity;
        self
    }

    /// Longest accepted `window`: one year.
    pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Checks the invariants the limiter relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.window > Self::MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge {
                max: Self::MAX_WINDOW,
            });
        }
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }

    /// Returns the queue capacity as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` queued tasks
    #[inline]
    pub fn queue_limit(&self) -> Option<usize> {
        if self.max_queue_size == 0 {
            None
        } else {
            Some(self.max_queue_size)
        }
    }

    /// Returns the default per-task timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.task_timeout.is_zero() {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_map_to_none() {
        let cfg = RateLimiterConfig::new("api", 5, Duration::from_secs(1));
        assert_eq!(cfg.queue_limit(), None);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.order, QueueOrder::Fifo);

        let cfg = cfg
            .with_max_queue_size(10)
            .with_task_timeout(Duration::from_millis(250));
        assert_eq!(cfg.queue_limit(), Some(10));
        assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let cfg = RateLimiterConfig::new("api", 0, Duration::from_secs(1));
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxRequests));

        let cfg = RateLimiterConfig::new("api", 1, Duration::ZERO);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWindow));

        let cfg = RateLimiterConfig::new("", 1, Duration::from_secs(1));
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyName));
    }

    #[test]
    fn test_validate_caps_window() {
        let cfg = RateLimiterConfig::new("api", 1, RateLimiterConfig::MAX_WINDOW);
        assert_eq!(cfg.validate(), Ok(()));

        let too_long = RateLimiterConfig::MAX_WINDOW + Duration::from_nanos(1);
        for window in [too_long, Duration::MAX] {
            let cfg = RateLimiterConfig::new("api", 1, window);
            let err = cfg.validate().unwrap_err();
            assert_eq!(
                err,
                ConfigError::WindowTooLarge {
                    max: RateLimiterConfig::MAX_WINDOW
                }
            );
            assert_eq!(err.as_label(), "config_window_too_large");
        }
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = RateLimiterConfig::new("api", 1, Duration::from_secs(1)).with_bus_capacity(0);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
