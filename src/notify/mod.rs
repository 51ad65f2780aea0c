pub mod console;
pub mod discord;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use crate::error::{Result, WatchError};

/// Delivers a human-visible alert that a product became available.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, url: &str) -> Result<()>;
}

/// Fans one alert out to every configured notifier.
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    async fn send(&self, title: &str, url: &str) -> Result<()> {
        let mut failures = Vec::new();

        for notifier in &self.notifiers {
            if let Err(e) = notifier.send(title, url).await {
                error!("Notifier failed for {}: {}", url, e);
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WatchError::Notify(failures.join("; ")))
        }
    }
}
