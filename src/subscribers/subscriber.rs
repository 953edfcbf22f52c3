//! # Limiter event subscriber.
//!
//! A [`Subscribe`] implementation observes what a [`RateLimiter`](crate::RateLimiter)
//! does: admissions, starts, settlements, saturation and lifecycle changes. It is
//! attached at build time via
//! [`RateLimiterBuilder::with_subscribers`](crate::RateLimiterBuilder::with_subscribers)
//! or a [`LimiterFactory`](crate::LimiterFactory).
//!
//! Delivery runs on a worker task owned by the [`SubscriberSet`](crate::SubscriberSet),
//! one per subscriber, fed from a bounded queue sized by [`Subscribe::queue_capacity`].
//! A subscriber that falls behind loses events (reported as
//! `EventKind::SubscriberOverflow`); a subscriber that panics is reported as
//! `EventKind::SubscriberPanicked` and keeps receiving later events. Neither ever
//! delays admission or dispatch.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use ratevisor::{Event, EventKind, Subscribe};
//!
//! /// Counts how often the window was the bottleneck.
//! #[derive(Default)]
//! struct SaturationCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for SaturationCounter {
//!     async fn on_event(&self, _ev: &Event) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn accepts(&self, kind: EventKind) -> bool {
//!         kind == EventKind::WindowSaturated
//!     }
//!
//!     fn name(&self) -> &'static str { "saturation-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Receiver of limiter events.
///
/// Handlers should not block the executor; do slow I/O asynchronously or hand it off.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event, on this subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Kinds this subscriber wants. Rejected kinds never enter its queue,
    /// so they cannot cause overflow. Default: all.
    fn accepts(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }

    /// Label used in overflow/panic reports. Default: the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
