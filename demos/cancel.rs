//! # Example: Cancellation, timeouts and shutdown
//!
//! - a running task cancelled by id keeps running in the background,
//! - a queued task is cancelled through an external token,
//! - a queued task times out before the window frees up,
//! - `stop()` rejects what is still queued.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ratevisor::{QueueOrder, RateLimiter, RateLimiterConfig, TaskOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = RateLimiterConfig::new("cancel-demo", 1, Duration::from_secs(1))
        .with_order(QueueOrder::Priority);
    let limiter = RateLimiter::new(cfg)?;

    let slow = limiter.enqueue(TaskOptions::new().with_id("slow"), |ctx: CancellationToken| async move {
        tokio::select! {
            _ = ctx.cancelled() => println!("[slow] noticed cancellation, cleaning up"),
            _ = tokio::time::sleep(Duration::from_secs(5)) => println!("[slow] finished"),
        }
        Ok::<_, std::io::Error>(())
    })?;

    let shutdown = CancellationToken::new();
    let signalled = limiter.enqueue(
        TaskOptions::new().with_signal(shutdown.child_token()),
        |_ctx| async { Ok::<_, std::io::Error>("never runs") },
    )?;
    let impatient = limiter.enqueue(
        TaskOptions::new().with_timeout(Duration::from_millis(200)),
        |_ctx| async { Ok::<_, std::io::Error>("never runs") },
    )?;
    let leftover = limiter.enqueue(TaskOptions::new().with_priority(-1), |_ctx| async {
        Ok::<_, std::io::Error>("never runs")
    })?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("cancel slow: {}", limiter.cancel("slow"));
    println!("slow       -> {:?}", slow.await.map_err(|e| e.as_label()));

    shutdown.cancel();
    println!("signalled  -> {:?}", signalled.await.map_err(|e| e.as_label()));
    println!("impatient  -> {:?}", impatient.await.map_err(|e| e.as_label()));

    limiter.stop().await;
    println!("leftover   -> {:?}", leftover.await.map_err(|e| e.as_label()));
    println!("{:#?}", limiter.stats());
    Ok(())
}
