//! # Rolling-window rate limiter.
//!
//! [`RateLimiter`] owns a queue of submitted tasks and starts them no faster than
//! `max_requests` per trailing `window`. Each submission returns a [`TaskHandle`]
//! that resolves exactly once.
//!
//! ## Task lifecycle
//! ```text
//! enqueue ──► queued ──► running ──► settled (Ok / Failed / Panicked)
//!               │           ├──────► settled (Timeout / Cancelled)
//!               └──────────────────► settled (Timeout / Cancelled / Stopped)
//! ```
//!
//! ## Limiter lifecycle
//! ```text
//! Running ── stop() ──► Draining ── running == 0 ──► Stopped
//!    ▲                                                  │
//!    └──────────────────────── start() ─────────────────┘
//! ```

mod builder;
mod core;
mod handle;
mod options;
mod order;
mod queue;
mod state;
mod stats;
mod window;

pub use builder::RateLimiterBuilder;
pub use self::core::RateLimiter;
pub use handle::TaskHandle;
pub use options::TaskOptions;
pub use order::QueueOrder;
pub use state::LimiterState;
pub use stats::RateLimiterStats;
