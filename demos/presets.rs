//! # Example: One limiter per resource
//!
//! Builds limiters from presets through a shared factory and passes them to the
//! code paths that need them. Nothing is global.

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use ratevisor::{LimiterFactory, LogWriter, Preset, RateLimiter, Subscribe, TaskOptions};

struct Services {
    api: Arc<RateLimiter>,
    writes: Arc<RateLimiter>,
}

async fn sync_guild(services: &Services, guild: u64) -> anyhow::Result<()> {
    let members = services
        .api
        .run(TaskOptions::new().with_priority(1), move |_ctx| async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok::<_, std::io::Error>(vec![guild * 10, guild * 10 + 1])
        })
        .await?;

    services
        .writes
        .run(
            TaskOptions::new().with_id(format!("guild-{guild}-write")),
            move |_ctx| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, std::io::Error>(members.len())
            },
        )
        .await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ratevisor=info".into()))
        .init();

    for preset in Preset::ALL {
        let cfg = preset.config();
        println!(
            "{:<15} {:>4} per {:?}, queue {}, timeout {:?}, {:?}",
            preset.name(),
            cfg.max_requests,
            cfg.window,
            cfg.max_queue_size,
            cfg.task_timeout,
            cfg.order
        );
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let factory = LimiterFactory::new().with_subscribers(subs);
    let services = Services {
        api: factory.create(Preset::ExternalApi)?,
        writes: factory.create_named(Preset::DatabaseWrite, "guild-writes")?,
    };

    for guild in 1..=5 {
        sync_guild(&services, guild).await?;
    }

    services.api.stop().await;
    services.writes.stop().await;
    println!("api:    {:?}", services.api.stats());
    println!("writes: {:?}", services.writes.stats());
    Ok(())
}
