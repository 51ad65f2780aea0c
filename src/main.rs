use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use stock_watch::notify::{ConsoleNotifier, DiscordNotifier, NotifierSet};
use stock_watch::utils::http::{create_client, HttpFetcher};
use stock_watch::{Config, Monitor, MonitorSettings, Notifier, WatchedSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stock_watch=info".parse()?),
        )
        .init();

    info!("Starting Stock Watch");

    let config = Config::load()?;
    let sources = WatchedSource::from_config(&config)?;
    let fetcher = Arc::new(HttpFetcher::from_config(&config)?);

    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(ConsoleNotifier)];
    if let Some(webhook) = &config.discord_webhook {
        info!("Discord notifications enabled");
        let client = create_client(Duration::from_secs(config.notify_timeout_seconds))?;
        notifiers.push(Arc::new(DiscordNotifier::new(client, webhook.clone())));
    }

    let monitor = Monitor::start(
        sources,
        fetcher,
        Arc::new(NotifierSet::new(notifiers)),
        MonitorSettings::from(&config),
    );

    tokio::signal::ctrl_c().await?;
    warn!("Interrupted, stopping {} pollers", monitor.poller_count());

    let state = monitor.shutdown().await;
    info!("Stopped with {} products in stock", state.len());

    Ok(())
}
