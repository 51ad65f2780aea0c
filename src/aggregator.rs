use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::error::{Result, WatchError};
use crate::models::{AvailabilityRecord, ProductLink};
use crate::notify::Notifier;
use crate::poller::panic_message;
use crate::utils::text::truncate_chars;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BecameAvailable,
    StillAvailable,
    BecameUnavailable,
    StillUnavailable,
}

/// Links currently believed to be in stock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityState {
    in_stock: HashSet<ProductLink>,
}

impl AvailabilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation into the state and report which transition it caused.
    pub fn apply(&mut self, link: &ProductLink, in_stock: bool) -> Transition {
        let known = self.in_stock.contains(link);
        match (in_stock, known) {
            (true, false) => {
                self.in_stock.insert(link.clone());
                Transition::BecameAvailable
            }
            (true, true) => Transition::StillAvailable,
            (false, true) => {
                self.in_stock.remove(link);
                Transition::BecameUnavailable
            }
            (false, false) => Transition::StillUnavailable,
        }
    }

    pub fn contains(&self, link: &ProductLink) -> bool {
        self.in_stock.contains(link)
    }

    pub fn len(&self) -> usize {
        self.in_stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_stock.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &ProductLink> {
        self.in_stock.iter()
    }
}

/// Single consumer of every poller's records and sole owner of the state.
pub struct Aggregator {
    state: AvailabilityState,
    notifier: Arc<dyn Notifier>,
    title_max_chars: usize,
    notify_timeout: Duration,
}

impl Aggregator {
    pub fn new(notifier: Arc<dyn Notifier>, title_max_chars: usize) -> Self {
        Self {
            state: AvailabilityState::new(),
            notifier,
            title_max_chars,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_notify_timeout(mut self, notify_timeout: Duration) -> Self {
        self.notify_timeout = notify_timeout;
        self
    }

    pub fn state(&self) -> &AvailabilityState {
        &self.state
    }

    pub async fn handle(&mut self, record: AvailabilityRecord) -> Transition {
        let transition = self.state.apply(&record.link, record.in_stock);

        match transition {
            Transition::BecameAvailable => {
                let title = truncate_chars(&record.title, self.title_max_chars);
                info!("In stock: {} ({})", title, record.link);
                // The state keeps the link even when delivery fails.
                if let Err(e) = self.notify(title, record.link.as_str()).await {
                    error!("Failed to notify for {}: {}", record.link, e);
                }
            }
            Transition::BecameUnavailable => {
                info!("Out of stock again: {}", record.link);
            }
            Transition::StillAvailable | Transition::StillUnavailable => {
                debug!("No change for {}", record.link);
            }
        }

        transition
    }

    /// Deliver one alert. A slow, failing or panicking notifier is reported as an error.
    async fn notify(&self, title: &str, url: &str) -> Result<()> {
        let delivery = AssertUnwindSafe(self.notifier.send(title, url)).catch_unwind();

        match timeout(self.notify_timeout, delivery).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(WatchError::Notify(format!(
                "notifier panicked: {}",
                panic_message(panic)
            ))),
            Err(_) => Err(WatchError::Notify(format!(
                "notifier timed out after {}s",
                self.notify_timeout.as_secs()
            ))),
        }
    }

    /// Process records one at a time until every producer has gone away.
    pub async fn run(mut self, mut records: mpsc::Receiver<AvailabilityRecord>) -> AvailabilityState {
        while let Some(record) = records.recv().await {
            self.handle(record).await;
        }

        info!("All pollers stopped, {} products in stock", self.state.len());
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, title: &str, url: &str) -> Result<()> {
            self.sent.lock().unwrap().push((title.to_string(), url.to_string()));
            if self.fail {
                return Err(WatchError::Notify("toast unavailable".to_string()));
            }
            Ok(())
        }
    }

    struct Panicking;

    #[async_trait]
    impl Notifier for Panicking {
        async fn send(&self, _title: &str, _url: &str) -> Result<()> {
            panic!("stdout closed")
        }
    }

    struct Hanging;

    #[async_trait]
    impl Notifier for Hanging {
        async fn send(&self, _title: &str, _url: &str) -> Result<()> {
            std::future::pending().await
        }
    }

    fn link(s: &str) -> ProductLink {
        ProductLink::from(s)
    }

    #[test]
    fn test_transition_table() {
        let mut state = AvailabilityState::new();
        let a = link("/p/a");

        assert_eq!(state.apply(&a, false), Transition::StillUnavailable);
        assert!(state.is_empty());
        assert_eq!(state.apply(&a, true), Transition::BecameAvailable);
        assert_eq!(state.apply(&a, true), Transition::StillAvailable);
        assert!(state.contains(&a));
        assert_eq!(state.apply(&a, false), Transition::BecameUnavailable);
        assert!(!state.contains(&a));
    }

    #[test]
    fn test_membership_follows_last_record_per_link() {
        let sequence = [
            ("/p/a", true),
            ("/p/b", false),
            ("/p/c", true),
            ("/p/a", false),
            ("/p/b", true),
            ("/p/c", true),
            ("/p/a", true),
            ("/p/c", false),
        ];

        let mut state = AvailabilityState::new();
        for (l, in_stock) in sequence {
            state.apply(&link(l), in_stock);
        }

        for l in ["/p/a", "/p/b", "/p/c", "/p/never"] {
            let last = sequence.iter().rev().find(|(s, _)| *s == l).map(|(_, v)| *v);
            assert_eq!(state.contains(&link(l)), last == Some(true), "{}", l);
        }
    }

    #[tokio::test]
    async fn test_one_notification_per_availability_run() {
        let notifier = Arc::new(Recording::default());
        let mut aggregator = Aggregator::new(notifier.clone(), 80);

        let mut notified_at = Vec::new();
        for (pos, in_stock) in [false, true, true, true, false, true].into_iter().enumerate() {
            let t = aggregator
                .handle(AvailabilityRecord::new("/p/123", "RTX 3070", in_stock))
                .await;
            if t == Transition::BecameAvailable {
                notified_at.push(pos + 1);
            }
        }

        assert_eq!(notified_at, vec![2, 6]);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_first_seen_absence_is_silent() {
        let notifier = Arc::new(Recording::default());
        let mut aggregator = Aggregator::new(notifier.clone(), 80);

        aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", false))
            .await;

        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(aggregator.state().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_state() {
        let notifier = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let mut aggregator = Aggregator::new(notifier.clone(), 80);

        aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", true))
            .await;
        aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", true))
            .await;

        assert!(aggregator.state().contains(&link("/p/a")));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notifier_panic_keeps_state_and_loop() {
        let mut aggregator = Aggregator::new(Arc::new(Panicking), 80);

        let first = aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", true))
            .await;
        let second = aggregator
            .handle(AvailabilityRecord::new("/p/b", "T", true))
            .await;

        assert_eq!(first, Transition::BecameAvailable);
        assert_eq!(second, Transition::BecameAvailable);
        assert!(aggregator.state().contains(&link("/p/a")));
        assert!(aggregator.state().contains(&link("/p/b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_notifier_times_out() {
        let mut aggregator =
            Aggregator::new(Arc::new(Hanging), 80).with_notify_timeout(Duration::from_secs(3));

        aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", true))
            .await;
        let next = aggregator
            .handle(AvailabilityRecord::new("/p/a", "T", false))
            .await;

        assert_eq!(next, Transition::BecameUnavailable);
        assert!(aggregator.state().is_empty());
    }

    #[tokio::test]
    async fn test_title_truncated_at_notification() {
        let notifier = Arc::new(Recording::default());
        let mut aggregator = Aggregator::new(notifier.clone(), 10);
        let long_title = "GIGABYTE GeForce RTX 3080 GAMING OC 10G";

        aggregator
            .handle(AvailabilityRecord::new("/p/a", long_title, true))
            .await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0], ("GIGABYTE G".to_string(), "/p/a".to_string()));
    }

    #[tokio::test]
    async fn test_run_drains_channel_and_returns_state() {
        let notifier = Arc::new(Recording::default());
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(Aggregator::new(notifier.clone(), 80).run(rx));

        tx.send(AvailabilityRecord::new("/p/a", "A", true)).await.unwrap();
        tx.send(AvailabilityRecord::new("/p/b", "B", true)).await.unwrap();
        tx.send(AvailabilityRecord::new("/p/a", "A", false)).await.unwrap();
        drop(tx);

        let state = task.await.unwrap();
        assert_eq!(state.links().cloned().collect::<Vec<_>>(), vec![link("/p/b")]);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }
}
