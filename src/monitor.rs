use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::aggregator::{Aggregator, AvailabilityState};
use crate::config::{Config, PollSchedule};
use crate::error::Result;
use crate::extraction::ExtractionSpec;
use crate::fetcher::PageFetcher;
use crate::notify::Notifier;
use crate::poller::Poller;

/// A compiled source ready to be polled.
#[derive(Debug, Clone)]
pub struct WatchedSource {
    pub spec: ExtractionSpec,
    pub schedule: PollSchedule,
}

impl WatchedSource {
    pub fn from_config(config: &Config) -> Result<Vec<Self>> {
        config
            .sources
            .iter()
            .map(|source| {
                Ok(Self {
                    spec: ExtractionSpec::from_config(source)?,
                    schedule: config.schedule_for(source),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub queue_capacity: usize,
    pub title_max_chars: usize,
    pub notify_timeout: Duration,
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            title_max_chars: config.title_max_chars,
            notify_timeout: Duration::from_secs(config.notify_timeout_seconds),
        }
    }
}

pub struct Monitor;

impl Monitor {
    /// Spawn one poller task per source plus the aggregator task.
    pub fn start(
        sources: Vec<WatchedSource>,
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> MonitorHandle {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));

        let aggregator = Aggregator::new(notifier, settings.title_max_chars)
            .with_notify_timeout(settings.notify_timeout);
        let aggregator = tokio::spawn(aggregator.run(rx));

        let pollers = sources
            .into_iter()
            .map(|source| {
                let poller = Poller::new(source.spec, fetcher.clone(), source.schedule, tx.clone());
                info!("Starting poller for {}", poller.name());
                tokio::spawn(poller.run())
            })
            .collect::<Vec<_>>();

        info!("Monitoring {} sources", pollers.len());

        MonitorHandle { aggregator, pollers }
    }
}

pub struct MonitorHandle {
    aggregator: JoinHandle<AvailabilityState>,
    pollers: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Wait for the aggregator, which only ends once every poller has stopped.
    pub async fn wait(self) -> AvailabilityState {
        join_aggregator(self.aggregator).await
    }

    /// Stop every poller, let the aggregator drain, and return its final state.
    pub async fn shutdown(self) -> AvailabilityState {
        for poller in &self.pollers {
            poller.abort();
        }
        for poller in self.pollers {
            // Cancellation is the expected outcome here.
            let _ = poller.await;
        }

        join_aggregator(self.aggregator).await
    }
}

async fn join_aggregator(handle: JoinHandle<AvailabilityState>) -> AvailabilityState {
    match handle.await {
        Ok(state) => state,
        Err(e) => {
            error!("Aggregator task failed: {}", e);
            AvailabilityState::default()
        }
    }
}
