use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, ClientBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, WatchError};
use crate::fetcher::PageFetcher;

pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = ClientBuilder::new()
        .timeout(timeout)
        .cookie_store(true)
        .pool_max_idle_per_host(6)
        .build()?;

    Ok(client)
}

/// Fetches listing pages over HTTP, rotating the User-Agent on every request.
pub struct HttpFetcher {
    client: Client,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl HttpFetcher {
    pub fn new(client: Client, user_agents: Vec<String>) -> Self {
        Self {
            client,
            user_agents,
            next_agent: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_client(Duration::from_secs(config.fetch_timeout_seconds))?;
        Ok(Self::new(client, config.user_agents.clone()))
    }

    fn user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        Some(&self.user_agents[idx])
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(agent) = self.user_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
