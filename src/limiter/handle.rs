//! # Caller-side task handle and the one-shot settlement slot behind it.
//!
//! Every accepted task owns exactly one [`Settler`]. Whoever takes the sender out
//! of it first delivers the outcome; later attempts are no-ops, so a task can never
//! be settled twice even if two completion paths race.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{LimiterError, Rejection};

use super::core::Shared;

type Slot<T, E> = oneshot::Sender<Result<T, LimiterError<E>>>;

/// Type-erased rejection path, stored alongside queued and running tasks.
pub(super) trait Reject: Send + Sync {
    /// Settles the task with a limiter-raised error. Returns `false` if already settled.
    fn reject(&self, reason: Rejection) -> bool;
}

/// One-shot settlement slot for a task producing `Result<T, E>`.
pub(super) struct Settler<T, E> {
    slot: Mutex<Option<Slot<T, E>>>,
}

impl<T, E> Settler<T, E> {
    pub fn new(tx: Slot<T, E>) -> Self {
        Self {
            slot: Mutex::new(Some(tx)),
        }
    }

    /// Delivers the outcome. Returns `false` if the task was already settled.
    pub fn settle(&self, outcome: Result<T, LimiterError<E>>) -> bool {
        let tx = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match tx {
            // A dropped handle still counts as settled.
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

impl<T: Send, E: Send> Reject for Settler<T, E> {
    fn reject(&self, reason: Rejection) -> bool {
        self.settle(Err(reason.into()))
    }
}

/// Future resolving to the outcome of an accepted task.
///
/// Returned by [`RateLimiter::enqueue`](crate::RateLimiter::enqueue). Dropping the
/// handle does **not** cancel the task; use [`TaskHandle::cancel`] for that.
///
/// Resolves to [`LimiterError::Stopped`] if the limiter is dropped while the task is queued.
#[must_use = "a TaskHandle does nothing unless awaited or cancelled"]
pub struct TaskHandle<T, E> {
    id: Arc<str>,
    rx: oneshot::Receiver<Result<T, LimiterError<E>>>,
    limiter: Weak<Shared>,
}

impl<T, E> TaskHandle<T, E> {
    pub(super) fn new(
        id: Arc<str>,
        rx: oneshot::Receiver<Result<T, LimiterError<E>>>,
        limiter: Weak<Shared>,
    ) -> Self {
        Self { id, rx, limiter }
    }

    /// Task id (caller-supplied or generated).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cancels this task; same semantics as [`RateLimiter::cancel`](crate::RateLimiter::cancel).
    pub fn cancel(&self) -> bool {
        self.limiter
            .upgrade()
            .is_some_and(|shared| shared.cancel(&self.id))
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, LimiterError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(LimiterError::Stopped)))
    }
}

impl<T, E> std::fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}
