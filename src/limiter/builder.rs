use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RateLimiterConfig,
    error::ConfigError,
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
};

use super::core::RateLimiter;

/// Builder for a [`RateLimiter`] with optional event subscribers.
pub struct RateLimiterBuilder {
    cfg: RateLimiterConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RateLimiterBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive limiter events (queueing, starts, settlements, lifecycle)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the configuration and starts the limiter.
    ///
    /// Must be called inside a tokio runtime: the dispatcher and subscriber
    /// workers are spawned here.
    pub fn build(self) -> Result<Arc<RateLimiter>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        // Subscribe before the limiter publishes `LimiterStarted`.
        let rx = (!self.subscribers.is_empty()).then(|| bus.subscribe());

        let limiter = RateLimiter::spawn(self.cfg, bus.clone());
        if let Some(rx) = rx {
            let set = SubscriberSet::new(self.subscribers, bus);
            tokio::spawn(forward(rx, set, limiter.closed_token()));
        }
        Ok(Arc::new(limiter))
    }
}

/// Pumps bus events into the subscriber set until the limiter is dropped.
async fn forward(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, closed: CancellationToken) {
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            ev = rx.recv() => match ev {
                Ok(ev) => set.emit(ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber forwarder lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
    while let Ok(ev) = rx.try_recv() {
        set.emit(ev);
    }
    set.shutdown().await;
}
