//! # Named limiter presets and a factory that applies them.
//!
//! Presets are pure data: each maps to a fixed [`RateLimiterConfig`]. The
//! [`LimiterFactory`] carries the subscribers every limiter it builds should share,
//! so callers construct one limiter per guarded resource and pass it around
//! explicitly.
//!
//! | Preset          | max / window | queue | timeout | order    |
//! |-----------------|--------------|-------|---------|----------|
//! | `ExternalApi`   | 50 / 1s      | 1000  | 30s     | priority |
//! | `Interactions`  | 5 / 5s       | 100   | 3s      | fifo     |
//! | `Database`      | 100 / 1s     | 5000  | 10s     | priority |
//! | `DatabaseWrite` | 20 / 1s      | 2000  | 15s     | fifo     |
//! | `Notifications` | 10 / 1s      | 500   | 5s      | fifo     |
//! | `Background`    | 5 / 1s       | 10000 | 60s     | priority |

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::RateLimiterConfig,
    error::ConfigError,
    limiter::{QueueOrder, RateLimiter},
    subscribers::Subscribe,
};

/// Built-in limiter profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Third-party HTTP APIs with a published request budget.
    ExternalApi,
    /// User-facing interaction replies; strict order, short deadline.
    Interactions,
    /// Read-heavy database access.
    Database,
    /// Database writes; conservative and ordered.
    DatabaseWrite,
    /// Outbound notifications (DMs, webhooks).
    Notifications,
    /// Low-urgency maintenance and sync jobs.
    Background,
}

impl Preset {
    /// All presets, in declaration order.
    pub const ALL: [Preset; 6] = [
        Preset::ExternalApi,
        Preset::Interactions,
        Preset::Database,
        Preset::DatabaseWrite,
        Preset::Notifications,
        Preset::Background,
    ];

    /// Default limiter name for this preset.
    pub fn name(self) -> &'static str {
        match self {
            Preset::ExternalApi => "external-api",
            Preset::Interactions => "interactions",
            Preset::Database => "database",
            Preset::DatabaseWrite => "database-write",
            Preset::Notifications => "notifications",
            Preset::Background => "background",
        }
    }

    /// The configuration this preset stands for.
    pub fn config(self) -> RateLimiterConfig {
        let (max, window_ms, queue, timeout_s, order) = match self {
            Preset::ExternalApi => (50, 1_000, 1_000, 30, QueueOrder::Priority),
            Preset::Interactions => (5, 5_000, 100, 3, QueueOrder::Fifo),
            Preset::Database => (100, 1_000, 5_000, 10, QueueOrder::Priority),
            Preset::DatabaseWrite => (20, 1_000, 2_000, 15, QueueOrder::Fifo),
            Preset::Notifications => (10, 1_000, 500, 5, QueueOrder::Fifo),
            Preset::Background => (5, 1_000, 10_000, 60, QueueOrder::Priority),
        };
        RateLimiterConfig::new(self.name(), max, Duration::from_millis(window_ms))
            .with_max_queue_size(queue)
            .with_task_timeout(Duration::from_secs(timeout_s))
            .with_order(order)
    }
}

/// Builds limiters from presets, attaching a shared set of subscribers.
///
/// ## Example
/// ```rust
/// use ratevisor::{LimiterFactory, Preset};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let factory = LimiterFactory::new();
///     let api = factory.create(Preset::ExternalApi)?;
///     let writes = factory.create_named(Preset::DatabaseWrite, "guild-writes")?;
///
///     assert_eq!(api.name(), "external-api");
///     assert_eq!(writes.name(), "guild-writes");
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct LimiterFactory {
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LimiterFactory {
    /// Creates a factory with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribers attached to every limiter this factory builds.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds a limiter from `preset`.
    pub fn create(&self, preset: Preset) -> Result<Arc<RateLimiter>, ConfigError> {
        self.custom(preset.config())
    }

    /// Builds a limiter from `preset` under a different name.
    pub fn create_named(
        &self,
        preset: Preset,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<Arc<RateLimiter>, ConfigError> {
        self.custom(preset.config().with_name(name))
    }

    /// Builds a limiter from an arbitrary configuration.
    pub fn custom(&self, cfg: RateLimiterConfig) -> Result<Arc<RateLimiter>, ConfigError> {
        RateLimiter::builder(cfg)
            .with_subscribers(self.subscribers.clone())
            .build()
    }
}

impl std::fmt::Debug for LimiterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterFactory")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_is_valid() {
        for preset in Preset::ALL {
            let cfg = preset.config();
            assert_eq!(cfg.validate(), Ok(()), "{preset:?}");
            assert_eq!(cfg.name, preset.name());
            assert!(cfg.queue_limit().is_some());
            assert!(cfg.default_timeout().is_some());
        }
    }

    #[test]
    fn test_write_path_is_fifo_and_tighter_than_reads() {
        let reads = Preset::Database.config();
        let writes = Preset::DatabaseWrite.config();
        assert!(writes.order.is_fifo());
        assert!(writes.max_requests < reads.max_requests);
    }

    #[tokio::test]
    async fn test_factory_overrides_name() {
        let factory = LimiterFactory::new();
        let limiter = factory
            .create_named(Preset::Notifications, "dm")
            .expect("valid preset");
        assert_eq!(limiter.name(), "dm");
        assert_eq!(limiter.config().max_requests, 10);
    }
}
