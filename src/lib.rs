//! # ratevisor
//!
//! **Ratevisor** is a rolling-window rate limiter and admission-controlled task
//! queue for async Rust.
//!
//! It bounds how many tasks may *start* within any trailing time window, queues
//! the rest with backpressure, and settles every accepted task exactly once. The
//! crate is meant to sit in front of rate-limited resources: third-party APIs,
//! database write paths, notification senders.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   caller #1  │   │   caller #2  │   │   caller #3  │
//!     │ enqueue(work)│   │ run(work)    │   │ cancel(id)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RateLimiter                                                      │
//! │  - TaskQueue (FIFO or priority, indexed by id)                    │
//! │  - WindowTracker (start instants inside the trailing window)      │
//! │  - running table + StatsCollector                                 │
//! │  (one mutex, never held across .await)                            │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//!  │  dispatcher  │   │ task waiter  │   │   watcher    │      │
//!  │ (window gate)│   │(timeout/race)│   │(queue expiry,│      │
//!  │              │   │              │   │ ext. signal) │      │
//!  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘      │
//!         │ Publishes:       │ Publishes:       │ Publishes:   │
//!         │ - TaskStarting   │ - TaskCompleted  │ - TimeoutHit │
//!         │ - WindowSatur.   │ - TaskFailed     │ - TaskCanc.  │
//!         ▼                  ▼                  ▼              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: RateLimiterConfig::bus_capacity)          │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber forwarder  │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Settlement
//! ```text
//! accepted task ──► exactly one of:
//!   Ok(T)                       work succeeded
//!   Err(Failed(E))              work returned an error (passed through verbatim)
//!   Err(Panicked { reason })    work panicked
//!   Err(Timeout { timeout })    deadline hit while queued or running
//!   Err(Cancelled)              cancel(id), TaskHandle::cancel, or external signal
//!   Err(Stopped)                stop() or drop while still queued
//! ```
//!
//! Cancellation is cooperative: work receives a `CancellationToken` that fires
//! when its task is settled early, but the limiter never aborts running work.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Limiter**       | Rolling-window admission, queueing, cancellation, shutdown.   | [`RateLimiter`], [`TaskHandle`]             |
//! | **Submissions**   | Per-task priority, id, timeout and external signal.           | [`TaskOptions`], [`QueueOrder`]             |
//! | **Presets**       | Named configurations and a factory with shared subscribers.   | [`Preset`], [`LimiterFactory`]              |
//! | **Subscriber API**| Hook into limiter events (logging, metrics, custom).          | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed admission, settlement and configuration errors.         | [`AdmissionError`], [`LimiterError`]        |
//! | **Configuration** | Budget, window, queue bound, default timeout.                 | [`RateLimiterConfig`]                       |
//!
//! ## Optional features
//! - `logging` (default): exports a built-in [`LogWriter`] that renders events as `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ratevisor::{LimiterError, QueueOrder, RateLimiter, RateLimiterConfig, TaskOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = RateLimiterConfig::new("external-api", 2, Duration::from_millis(50))
//!         .with_max_queue_size(100)
//!         .with_task_timeout(Duration::from_secs(5))
//!         .with_order(QueueOrder::Priority);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn ratevisor::Subscribe>> = vec![Arc::new(ratevisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn ratevisor::Subscribe>> = Vec::new();
//!
//!     let limiter = RateLimiter::builder(cfg).with_subscribers(subs).build()?;
//!
//!     let handles = (0..4)
//!         .map(|i| {
//!             limiter.enqueue(TaskOptions::new().with_priority(i), move |_ctx| async move {
//!                 Ok::<_, std::io::Error>(i * 10)
//!             })
//!         })
//!         .collect::<Result<Vec<_>, _>>()?;
//!
//!     for handle in handles {
//!         match handle.await {
//!             Ok(v) => println!("got {v}"),
//!             Err(LimiterError::Timeout { .. }) => println!("too slow"),
//!             Err(e) => return Err(e.into()),
//!         }
//!     }
//!
//!     limiter.stop().await;
//!     assert_eq!(limiter.stats().total_processed, 4);
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod limiter;
mod presets;
mod subscribers;

// ---- Public re-exports ----

pub use config::RateLimiterConfig;
pub use error::{AdmissionError, ConfigError, LimiterError};
pub use events::{Event, EventKind};
pub use limiter::{
    LimiterState, QueueOrder, RateLimiter, RateLimiterBuilder, RateLimiterStats, TaskHandle,
    TaskOptions,
};
pub use presets::{LimiterFactory, Preset};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

/// Re-exported so callers can name the token handed to work without a direct dependency.
pub use tokio_util::sync::CancellationToken;
