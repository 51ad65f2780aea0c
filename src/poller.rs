use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::PollSchedule;
use crate::error::{Result, WatchError};
use crate::extraction::ExtractionSpec;
use crate::fetcher::PageFetcher;
use crate::models::AvailabilityRecord;

/// Drives one source forever: fetch, extract, emit, sleep.
pub struct Poller {
    spec: ExtractionSpec,
    fetcher: Arc<dyn PageFetcher>,
    schedule: PollSchedule,
    records: mpsc::Sender<AvailabilityRecord>,
}

impl Poller {
    pub fn new(
        spec: ExtractionSpec,
        fetcher: Arc<dyn PageFetcher>,
        schedule: PollSchedule,
        records: mpsc::Sender<AvailabilityRecord>,
    ) -> Self {
        Self {
            spec,
            fetcher,
            schedule,
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Runs until the aggregator goes away. Cycle failures never end the loop.
    pub async fn run(self) {
        info!(
            "Polling {} every {}s",
            self.spec.name,
            self.schedule.interval.as_secs()
        );

        loop {
            let outcome = AssertUnwindSafe(self.poll_once())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(WatchError::Panicked(panic_message(panic))));

            match outcome {
                Ok(count) => debug!("{}: emitted {} records", self.spec.name, count),
                Err(WatchError::ChannelClosed) => {
                    warn!("{}: aggregator is gone, stopping poller", self.spec.name);
                    return;
                }
                Err(e) => error!("Request to {} failed: {}", self.spec.url, e),
            }

            sleep(self.schedule.interval).await;
        }
    }

    /// One fetch-extract-emit cycle. Returns the number of records emitted.
    pub async fn poll_once(&self) -> Result<usize> {
        let body = match timeout(self.schedule.fetch_timeout, self.fetcher.fetch(&self.spec.url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(WatchError::Timeout {
                    url: self.spec.url.clone(),
                    seconds: self.schedule.fetch_timeout.as_secs(),
                })
            }
        };

        let records = self.spec.extract_from_html(&body);
        let count = records.len();

        for record in records {
            self.records
                .send(record)
                .await
                .map_err(|_| WatchError::ChannelClosed)?;
        }

        Ok(count)
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
