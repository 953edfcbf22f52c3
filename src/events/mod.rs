//! Limiter events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by a [`RateLimiter`](crate::RateLimiter).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `RateLimiter::enqueue`, the dispatcher loop, task waiters,
//!   `stop`/`start`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the builder's subscriber listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
