use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info};

use super::Notifier;
use crate::error::{Result, WatchError};

const EMBED_COLOR: u32 = 0x76B900;

/// Posts alerts to a Discord webhook as a single embed.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

pub fn create_embed(title: &str, url: &str, detected_at: &str) -> Value {
    json!({
        "title": title,
        "url": url,
        "color": EMBED_COLOR,
        "footer": {
            "text": format!("Back in stock - Detected: {}", detected_at)
        }
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, title: &str, url: &str) -> Result<()> {
        let detected_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let payload = json!({
            "embeds": [create_embed(title, url, &detected_at)]
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            info!("Sent Discord notification for {}", title);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Discord webhook failed with status {}: {}", status, error_text);
            Err(WatchError::Notify(format!(
                "Discord webhook failed: {} - {}",
                status, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_embed_shape() {
        let embed = create_embed("RTX 3080", "https://shop.example/p/1", "2021-09-15 15:04:00");
        assert_eq!(embed["title"], "RTX 3080");
        assert_eq!(embed["url"], "https://shop.example/p/1");
        assert_eq!(embed["color"], EMBED_COLOR);
        assert_eq!(
            embed["footer"]["text"],
            "Back in stock - Detected: 2021-09-15 15:04:00"
        );
    }

    #[tokio::test]
    async fn test_posts_embed_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "embeds": [{ "title": "RTX 3080", "url": "https://shop.example/p/1" }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Client::new(), format!("{}/hook", server.uri()));
        notifier
            .send("RTX 3080", "https://shop.example/p/1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_webhook_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad embed"))
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Client::new(), format!("{}/hook", server.uri()));
        let err = notifier.send("t", "u").await.unwrap_err();
        assert!(matches!(err, WatchError::Notify(msg) if msg.contains("bad embed")));
    }
}
