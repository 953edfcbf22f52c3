//! # Example: Basic rate limiting
//!
//! Ten requests against a budget of 3 starts per second. Watch the
//! `task starting` lines arrive in groups of three.
//!
//! ```text
//! RUST_LOG=ratevisor=debug cargo run --example basic
//! ```

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ratevisor::{LimiterError, LogWriter, RateLimiter, RateLimiterConfig, Subscribe, TaskOptions};

/// Pretend HTTP call.
async fn fetch(id: u32, _ctx: CancellationToken) -> Result<String, std::io::Error> {
    tokio::time::sleep(Duration::from_millis(150)).await;
    if id == 7 {
        return Err(std::io::Error::other("upstream returned 503"));
    }
    Ok(format!("payload-{id}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ratevisor=debug".into()))
        .init();

    let cfg = RateLimiterConfig::new("demo-api", 3, Duration::from_secs(1))
        .with_max_queue_size(50)
        .with_task_timeout(Duration::from_secs(2));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let limiter = RateLimiter::builder(cfg).with_subscribers(subs).build()?;

    let mut handles = Vec::new();
    for id in 0..10 {
        handles.push(limiter.enqueue(TaskOptions::new(), move |ctx| fetch(id, ctx))?);
    }

    for handle in handles {
        let id = handle.id().to_string();
        match handle.await {
            Ok(body) => println!("[{id}] ok: {body}"),
            Err(LimiterError::Failed(e)) => println!("[{id}] upstream error: {e}"),
            Err(e) if e.is_retryable() => println!("[{id}] retry later: {e}"),
            Err(e) => println!("[{id}] gave up: {e}"),
        }
    }

    limiter.stop().await;
    println!("{:#?}", limiter.stats());
    Ok(())
}
