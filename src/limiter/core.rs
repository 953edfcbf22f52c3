//! # Rate limiter core: admission, dispatch, settlement.
//!
//! ## Architecture
//! ```text
//! enqueue(opts, work) ──► [TaskQueue] ──► dispatcher loop ──► tokio::spawn(drive)
//!        │   (sync admission check)     │  (window gate)          │
//!        │                              │                        ├─► tokio::spawn(work)  (detached on loss)
//!        └─► watcher (queue timeout,    └─► sleep until the      ├─► execution deadline
//!            external signal)               oldest start expires └─► cancellation token
//!
//! settlement: first of {work result, timeout, cancel, stop} wins; losers are discarded.
//! ```
//!
//! ## Rules
//! - Queue, window, running table and stats live behind **one** mutex; nothing awaits while holding it.
//! - Work always runs in its own tokio task, outside the lock.
//! - A task leaves the queue or the running table exactly once, under the lock; whoever
//!   removes it settles it. The [`Settler`] slot guards against a second delivery.
//! - Losing the race to a timeout or cancellation **detaches** the work; it is never aborted.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, broadcast, oneshot, watch};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RateLimiterConfig,
    error::{AdmissionError, ConfigError, LimiterError, Rejection},
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
};

use super::{
    builder::RateLimiterBuilder,
    handle::{Settler, TaskHandle},
    options::TaskOptions,
    queue::TaskQueue,
    state::{Launch, LimiterState, QueuedTask, RunningTask, Started},
    stats::{Outcome, RateLimiterStats, StatsCollector},
    window::WindowTracker,
};

/// Live gauges, broadcast on every change so waiters never poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct Load {
    pub queued: usize,
    pub running: usize,
}

/// How a running task's waiter observed the end of its work.
enum Exit {
    Completed,
    Failed(String),
    Timeout(Duration),
}

/// Why a queued task is removed without running.
#[derive(Clone, Copy)]
enum Retire {
    Cancelled,
    Rejected,
    TimedOut(Duration),
}

struct Inner {
    status: LimiterState,
    queue: TaskQueue<QueuedTask>,
    running: HashMap<Arc<str>, RunningTask>,
    window: WindowTracker,
    stats: StatsCollector,
    next_seq: u64,
    next_id: u64,
    saturated_until: Option<Instant>,
}

impl Inner {
    fn contains(&self, id: &str) -> bool {
        self.queue.contains(id) || self.running.contains_key(id)
    }

    fn generate_id(&mut self) -> Arc<str> {
        loop {
            self.next_id += 1;
            let id = format!("task-{}", self.next_id);
            if !self.contains(&id) {
                return id.into();
            }
        }
    }

    fn load(&self) -> Load {
        Load {
            queued: self.queue.len(),
            running: self.running.len(),
        }
    }
}

/// State shared by the limiter handle, its dispatcher, and task waiters.
pub(crate) struct Shared {
    cfg: RateLimiterConfig,
    name: Arc<str>,
    bus: Bus,
    inner: Mutex<Inner>,
    wake: Notify,
    load: watch::Sender<Load>,
    closed: CancellationToken,
}

impl Shared {
    fn new(cfg: RateLimiterConfig, bus: Bus) -> Self {
        let inner = Inner {
            status: LimiterState::Running,
            queue: TaskQueue::new(cfg.order),
            running: HashMap::new(),
            window: WindowTracker::new(cfg.window),
            stats: StatsCollector::default(),
            next_seq: 0,
            next_id: 0,
            saturated_until: None,
        };
        let (load, _) = watch::channel(Load::default());
        Self {
            name: Arc::from(cfg.name.as_ref()),
            cfg,
            bus,
            inner: Mutex::new(inner),
            wake: Notify::new(),
            load,
            closed: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_limiter(Arc::clone(&self.name))
    }

    fn sync_load(&self, inner: &Inner) {
        self.load.send_replace(inner.load());
    }

    fn enqueue<F, Fut, T, E>(
        self: &Arc<Self>,
        options: TaskOptions,
        work: F,
    ) -> Result<TaskHandle<T, E>, AdmissionError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let timeout = options.effective_timeout(self.cfg.default_timeout());
        let TaskOptions {
            priority, id, signal, ..
        } = options;
        // A deadline past the clock's range never fires.
        let now = Instant::now();
        let expiry = timeout.and_then(|t| now.checked_add(t).map(|at| (at, t)));

        let mut inner = self.lock();
        if inner.status != LimiterState::Running {
            return Err(AdmissionError::Stopped);
        }
        if let Some(capacity) = self.cfg.queue_limit() {
            if inner.queue.len() >= capacity {
                self.bus.publish(
                    self.event(EventKind::QueueFull)
                        .with_reason(format!("capacity={capacity}")),
                );
                return Err(AdmissionError::QueueFull { capacity });
            }
        }
        let id: Arc<str> = match id {
            Some(id) if inner.contains(&id) => return Err(AdmissionError::DuplicateId { id }),
            Some(id) => id.into(),
            None => inner.generate_id(),
        };

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let settler = Arc::new(Settler::new(tx));

        let runner_settler = Arc::clone(&settler);
        let launch: Launch = Box::new(move |shared: Arc<Shared>, started: Started| {
            tokio::spawn(drive(shared, started, work, runner_settler));
        });

        let mut ev = self
            .event(EventKind::TaskQueued)
            .with_task(Arc::clone(&id))
            .with_priority(priority);
        if let Some(t) = timeout {
            ev = ev.with_timeout(t);
        }

        let pushed = inner.queue.push(
            Arc::clone(&id),
            priority,
            seq,
            QueuedTask {
                priority,
                enqueued_at: now,
                timeout,
                token: token.clone(),
                reject: settler,
                launch,
            },
        );
        debug_assert!(pushed, "id uniqueness checked under the same lock");
        self.bus.publish(ev);
        self.sync_load(&inner);
        drop(inner);

        if expiry.is_some() || signal.is_some() {
            tokio::spawn(watch_task(Arc::clone(self), Arc::clone(&id), token, signal, expiry));
        }
        self.wake.notify_one();

        Ok(TaskHandle::new(id, rx, Arc::downgrade(self)))
    }

    /// Starts every task the window allows; returns when the next slot frees up, if the
    /// queue is still non-empty.
    fn dispatch_ready(self: &Arc<Self>) -> Option<Instant> {
        let mut launches = Vec::new();
        let next_slot = {
            let mut inner = self.lock();
            let next_slot = self.admit(&mut inner, &mut launches);
            self.sync_load(&inner);
            next_slot
        };
        for (launch, started) in launches {
            launch(Arc::clone(self), started);
        }
        next_slot
    }

    fn admit(&self, inner: &mut Inner, launches: &mut Vec<(Launch, Started)>) -> Option<Instant> {
        while inner.status == LimiterState::Running && !inner.queue.is_empty() {
            let now = Instant::now();
            if let Some(free_at) = inner.window.next_slot(now, self.cfg.max_requests) {
                if inner.saturated_until != Some(free_at) {
                    inner.saturated_until = Some(free_at);
                    self.bus.publish(
                        self.event(EventKind::WindowSaturated)
                            .with_delay(free_at.saturating_duration_since(now)),
                    );
                }
                return Some(free_at);
            }

            let Some((id, task)) = inner.queue.pop() else {
                break;
            };
            inner.window.record(now);
            self.bus.publish(
                self.event(EventKind::TaskStarting)
                    .with_task(Arc::clone(&id))
                    .with_priority(task.priority)
                    .with_delay(now.saturating_duration_since(task.enqueued_at)),
            );
            inner.running.insert(
                Arc::clone(&id),
                RunningTask {
                    enqueued_at: task.enqueued_at,
                    started_at: now,
                    token: task.token.clone(),
                    reject: task.reject,
                },
            );
            launches.push((
                task.launch,
                Started {
                    id,
                    started_at: now,
                    timeout: task.timeout,
                    token: task.token,
                },
            ));
        }
        None
    }

    /// Settles a running task from its own waiter. Returns `false` if it was already
    /// settled by `cancel`, in which case the caller must discard its outcome.
    fn finish(&self, id: &str, exit: Exit) -> bool {
        let mut inner = self.lock();
        let Some(task) = inner.running.remove(id) else {
            return false;
        };
        task.token.cancel();

        let elapsed = task.started_at.elapsed();
        let (outcome, ev) = match exit {
            Exit::Completed => (Outcome::Completed, self.event(EventKind::TaskCompleted)),
            Exit::Failed(reason) => (
                Outcome::Failed,
                self.event(EventKind::TaskFailed).with_reason(reason),
            ),
            Exit::Timeout(timeout) => (
                Outcome::Timeout,
                self.event(EventKind::TimeoutHit)
                    .with_timeout(timeout)
                    .with_reason("running"),
            ),
        };
        inner.stats.record(outcome, task.waited(), Some(elapsed));
        self.bus.publish(ev.with_task(id).with_elapsed(elapsed));
        self.sync_load(&inner);
        drop(inner);

        self.wake.notify_one();
        true
    }

    /// Records stats and publishes the event for a queued task leaving without running.
    fn retire(&self, inner: &mut Inner, id: &str, task: &QueuedTask, why: Retire) {
        let waited = task.enqueued_at.elapsed();
        let ev = match why {
            Retire::Cancelled => {
                inner.stats.record(Outcome::Cancelled, waited, None);
                self.event(EventKind::TaskCancelled).with_reason("queued")
            }
            Retire::Rejected => {
                inner.stats.record(Outcome::Rejected, waited, None);
                self.event(EventKind::TaskRejected)
            }
            Retire::TimedOut(timeout) => {
                inner.stats.record(Outcome::Timeout, waited, None);
                self.event(EventKind::TimeoutHit)
                    .with_timeout(timeout)
                    .with_reason("queued")
            }
        };
        self.bus
            .publish(ev.with_task(id).with_priority(task.priority).with_delay(waited));
    }

    /// Removes every queued task. Settle the returned tasks after releasing the lock.
    fn take_queued(&self, inner: &mut Inner, why: Retire) -> Vec<(Arc<str>, QueuedTask)> {
        let drained = inner.queue.drain();
        for (id, task) in &drained {
            self.retire(inner, id, task, why);
        }
        self.sync_load(inner);
        drained
    }

    /// Settles a task that never started because its queue timeout elapsed.
    fn expire_queued(&self, id: &str, timeout: Duration) -> bool {
        let mut inner = self.lock();
        let Some(task) = inner.queue.remove(id) else {
            return false;
        };
        self.retire(&mut inner, id, &task, Retire::TimedOut(timeout));
        self.sync_load(&inner);
        drop(inner);

        task.token.cancel();
        task.reject.reject(Rejection::Timeout(timeout));
        true
    }

    pub(super) fn cancel(&self, id: &str) -> bool {
        let mut inner = self.lock();
        if let Some(task) = inner.queue.remove(id) {
            self.retire(&mut inner, id, &task, Retire::Cancelled);
            self.sync_load(&inner);
            drop(inner);

            task.token.cancel();
            task.reject.reject(Rejection::Cancelled);
            return true;
        }

        let Some(task) = inner.running.remove(id) else {
            return false;
        };
        let elapsed = task.started_at.elapsed();
        inner
            .stats
            .record(Outcome::Cancelled, task.waited(), Some(elapsed));
        self.bus.publish(
            self.event(EventKind::TaskCancelled)
                .with_task(id)
                .with_reason("running")
                .with_elapsed(elapsed),
        );
        self.sync_load(&inner);
        drop(inner);

        // The work keeps running detached; only the caller stops waiting.
        task.token.cancel();
        task.reject.reject(Rejection::Cancelled);
        true
    }

    fn cancel_all(&self) -> usize {
        let cancelled = {
            let mut inner = self.lock();
            self.take_queued(&mut inner, Retire::Cancelled)
        };
        let n = cancelled.len();
        settle_queued(cancelled, Rejection::Cancelled);
        n
    }

    fn stats(&self) -> RateLimiterStats {
        let inner = self.lock();
        inner.stats.snapshot(
            inner.queue.len(),
            inner.running.len(),
            inner.window.admitted(Instant::now()),
        )
    }
}

fn settle_queued(tasks: Vec<(Arc<str>, QueuedTask)>, reason: Rejection) {
    for (_, task) in tasks {
        task.token.cancel();
        task.reject.reject(reason.clone());
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Runs one admitted task and settles it, unless `cancel` got there first.
async fn drive<F, Fut, T, E>(shared: Arc<Shared>, started: Started, work: F, settler: Arc<Settler<T, E>>)
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let Started {
        id,
        started_at,
        timeout,
        token,
    } = started;
    let deadline = timeout.and_then(|t| started_at.checked_add(t));

    // Admitted work always runs; a cancelled token tells it to bail out.
    // `work` is called inside the task so an early panic surfaces as a `JoinError`.
    let mut work = {
        let token = token.clone();
        tokio::spawn(async move { work(token).await })
    };
    let joined = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        res = &mut work => res,
        _ = sleep_until(deadline) => {
            if let Some(timeout) = timeout {
                if shared.finish(&id, Exit::Timeout(timeout)) {
                    settler.settle(Err(LimiterError::Timeout { timeout }));
                }
            }
            return;
        }
    };

    let (exit, outcome) = match joined {
        Ok(Ok(value)) => (Exit::Completed, Ok(value)),
        Ok(Err(err)) => (Exit::Failed(err.to_string()), Err(LimiterError::Failed(err))),
        Err(join_err) if join_err.is_panic() => {
            let reason = panic_message(&*join_err.into_panic());
            (
                Exit::Failed(format!("panicked: {reason}")),
                Err(LimiterError::Panicked { reason }),
            )
        }
        Err(_) => (Exit::Failed("aborted".into()), Err(LimiterError::Stopped)),
    };
    if shared.finish(&id, exit) {
        settler.settle(outcome);
    }
}

/// Watches a task's queue deadline and external signal until it is settled.
async fn watch_task(
    shared: Arc<Shared>,
    id: Arc<str>,
    token: CancellationToken,
    signal: Option<CancellationToken>,
    mut expiry: Option<(Instant, Duration)>,
) {
    let signalled = async move {
        match signal {
            Some(signal) => signal.cancelled().await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(signalled);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = &mut signalled => {
                shared.cancel(&id);
                return;
            }
            _ = sleep_until(expiry.map(|(at, _)| at)) => {
                // Only applies while still queued; execution has its own deadline.
                if let Some((_, timeout)) = expiry.take() {
                    shared.expire_queued(&id, timeout);
                }
            }
        }
    }
}

async fn dispatch_loop(shared: Arc<Shared>) {
    loop {
        let next_slot = shared.dispatch_ready();
        tokio::select! {
            _ = shared.closed.cancelled() => break,
            _ = shared.wake.notified() => {}
            _ = sleep_until(next_slot) => {}
        }
    }
}

/// Rolling-window rate limiter with an admission-controlled task queue.
///
/// At most `max_requests` tasks **start** within any trailing `window`; the rest wait
/// in a bounded queue ordered FIFO or by priority. Every accepted task is settled
/// exactly once: with its work's result, or with a [`LimiterError`] for timeout,
/// cancellation or shutdown.
///
/// Construct one limiter per guarded resource and share it with `Arc`; there are no
/// global instances. Building requires a running tokio runtime.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use ratevisor::{RateLimiter, RateLimiterConfig, TaskOptions};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let limiter = RateLimiter::new(RateLimiterConfig::new("api", 2, Duration::from_millis(100)))?;
///
///     let answer = limiter
///         .run(TaskOptions::default(), |_ctx| async { Ok::<_, std::io::Error>(42) })
///         .await?;
///     assert_eq!(answer, 42);
///     assert_eq!(limiter.stats().total_processed, 1);
///     Ok(())
/// }
/// ```
pub struct RateLimiter {
    shared: Arc<Shared>,
}

impl RateLimiter {
    /// Returns a builder for attaching subscribers before the limiter starts.
    pub fn builder(cfg: RateLimiterConfig) -> RateLimiterBuilder {
        RateLimiterBuilder::new(cfg)
    }

    /// Validates `cfg` and starts a limiter without subscribers.
    pub fn new(cfg: RateLimiterConfig) -> Result<Arc<Self>, ConfigError> {
        Self::builder(cfg).build()
    }

    /// Spawns the dispatcher. `cfg` must already be validated.
    pub(super) fn spawn(cfg: RateLimiterConfig, bus: Bus) -> Self {
        let shared = Arc::new(Shared::new(cfg, bus));
        shared.bus.publish(shared.event(EventKind::LimiterStarted));
        tokio::spawn(dispatch_loop(Arc::clone(&shared)));
        Self { shared }
    }

    pub(super) fn closed_token(&self) -> CancellationToken {
        self.shared.closed.clone()
    }

    /// Submits a task.
    ///
    /// Admission is decided synchronously: the call fails with [`AdmissionError`] if the
    /// limiter is not running, the queue is full, or the id is taken. Otherwise the task
    /// is queued and the returned [`TaskHandle`] resolves with its outcome.
    ///
    /// `work` receives a [`CancellationToken`] that is cancelled when the task is
    /// cancelled, times out, or is otherwise settled. Honoring it is optional: the
    /// limiter never aborts running work, it only stops waiting for it.
    pub fn enqueue<F, Fut, T, E>(
        &self,
        options: TaskOptions,
        work: F,
    ) -> Result<TaskHandle<T, E>, AdmissionError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.shared.enqueue(options, work)
    }

    /// Submits a task and waits for its outcome.
    pub async fn run<F, Fut, T, E>(&self, options: TaskOptions, work: F) -> Result<T, LimiterError<E>>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.enqueue(options, work)?.await
    }

    /// Cancels a queued or running task; returns whether the id was found.
    ///
    /// A running task's caller is settled with [`LimiterError::Cancelled`] at once; its
    /// work continues in the background and its eventual result is discarded.
    pub fn cancel(&self, id: &str) -> bool {
        self.shared.cancel(id)
    }

    /// Cancels every queued task (running tasks are untouched); returns how many.
    pub fn cancel_all(&self) -> usize {
        self.shared.cancel_all()
    }

    /// Alias of [`RateLimiter::cancel_all`].
    pub fn clear(&self) -> usize {
        self.cancel_all()
    }

    /// Stops the limiter.
    ///
    /// New submissions are refused immediately and queued tasks are rejected with
    /// [`LimiterError::Stopped`]. Resolves once every running task has settled.
    pub async fn stop(&self) {
        let rejected = {
            let mut inner = self.shared.lock();
            match inner.status {
                LimiterState::Stopped => return,
                LimiterState::Running => {
                    inner.status = LimiterState::Draining;
                    self.shared
                        .bus
                        .publish(self.shared.event(EventKind::DrainRequested));
                }
                LimiterState::Draining => {}
            }
            self.shared.take_queued(&mut inner, Retire::Rejected)
        };
        settle_queued(rejected, Rejection::Stopped);

        let mut load = self.shared.load.subscribe();
        let _ = load.wait_for(|l| l.running == 0).await;

        let mut inner = self.shared.lock();
        if inner.status == LimiterState::Draining {
            inner.status = LimiterState::Stopped;
            self.shared
                .bus
                .publish(self.shared.event(EventKind::LimiterStopped));
        }
    }

    /// Resumes a stopped or draining limiter.
    pub fn start(&self) {
        let mut inner = self.shared.lock();
        if inner.status != LimiterState::Running {
            inner.status = LimiterState::Running;
            inner.saturated_until = None;
            self.shared
                .bus
                .publish(self.shared.event(EventKind::LimiterStarted));
        }
        drop(inner);
        self.shared.wake.notify_one();
    }

    /// Resolves when the queue is empty and no task is running.
    pub async fn wait_for_completion(&self) {
        let mut load = self.shared.load.subscribe();
        let _ = load.wait_for(|l| l.queued == 0 && l.running == 0).await;
    }

    pub fn stats(&self) -> RateLimiterStats {
        self.shared.stats()
    }

    pub fn state(&self) -> LimiterState {
        self.shared.lock().status
    }

    pub fn is_running(&self) -> bool {
        self.state() == LimiterState::Running
    }

    pub fn queue_size(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// True if the queue is bounded and at capacity.
    pub fn is_queue_full(&self) -> bool {
        self.shared
            .cfg
            .queue_limit()
            .is_some_and(|cap| self.queue_size() >= cap)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.shared.cfg
    }

    /// Receiver for this limiter's events (only events published after the call).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }
}

impl Drop for RateLimiter {
    /// Ends the dispatcher and rejects queued tasks with [`LimiterError::Stopped`].
    /// Running tasks finish and settle normally.
    fn drop(&mut self) {
        self.shared.closed.cancel();
        let rejected = {
            let mut inner = self.shared.lock();
            inner.status = LimiterState::Stopped;
            self.shared.take_queued(&mut inner, Retire::Rejected)
        };
        settle_queued(rejected, Rejection::Stopped);
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.shared.name)
            .field("max_requests", &self.shared.cfg.max_requests)
            .field("window", &self.shared.cfg.window)
            .finish()
    }
}
