use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::time::Duration;
use url::Url;

use crate::error::{Result, WatchError};

pub const DEFAULT_CONFIG_NAME: &str = "stock_watch";
pub const CONFIG_PATH_ENV: &str = "STOCK_WATCH_CONFIG";
pub const ENV_PREFIX: &str = "STOCK_WATCH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_seconds: u64,
    pub fetch_timeout_seconds: u64,
    pub notify_timeout_seconds: u64,
    pub title_max_chars: usize,
    pub queue_capacity: usize,
    pub user_agents: Vec<String>,
    pub discord_webhook: Option<String>,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub list_selector: String,
    pub link_selector: String,
    pub stock_selector: String,
    pub stock_rule: StockRule,
    #[serde(default)]
    pub link_rewrite: Option<LinkRewrite>,
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
}

/// How the stock indicator's text decides availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRule {
    pub in_stock_when: StockMatch,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMatch {
    /// Trimmed text equals `text`
    Equals,
    /// Trimmed text differs from `text`
    NotEquals,
    /// `text` is a regex found anywhere in the text
    Matches,
}

/// Link canonicalization: strip first, then resolve against `base_url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkRewrite {
    #[serde(default)]
    pub strip_pattern: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Timing for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
            fetch_timeout_seconds: 20,
            notify_timeout_seconds: 20,
            title_max_chars: 80,
            queue_capacity: 1,
            user_agents: default_user_agents(),
            discord_webhook: None,
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Load from an optional config file plus `STOCK_WATCH__*` environment overrides.
    pub fn load() -> Result<Self> {
        let file = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => File::with_name(&path),
            Err(_) => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Self::finish(settings.try_deserialize()?)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        Self::finish(settings.try_deserialize()?)
    }

    fn finish(mut config: Config) -> Result<Self> {
        if config.sources.is_empty() {
            config.sources = builtin_sources();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            return Err(invalid("poll_interval_seconds must be greater than 0"));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(invalid("fetch_timeout_seconds must be greater than 0"));
        }
        if self.notify_timeout_seconds == 0 {
            return Err(invalid("notify_timeout_seconds must be greater than 0"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be greater than 0"));
        }
        if self.title_max_chars == 0 {
            return Err(invalid("title_max_chars must be greater than 0"));
        }
        if self.user_agents.is_empty() {
            return Err(invalid("at least one user agent is required"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(invalid(&format!("duplicate source name '{}'", source.name)));
            }
            if Url::parse(&source.url).is_err() {
                return Err(invalid(&format!(
                    "source '{}' has an invalid url: {}",
                    source.name, source.url
                )));
            }
            if source.poll_interval_seconds == Some(0) {
                return Err(invalid(&format!(
                    "source '{}' poll_interval_seconds must be greater than 0",
                    source.name
                )));
            }
        }

        Ok(())
    }

    pub fn schedule_for(&self, source: &SourceConfig) -> PollSchedule {
        PollSchedule {
            interval: Duration::from_secs(
                source
                    .poll_interval_seconds
                    .unwrap_or(self.poll_interval_seconds),
            ),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_seconds),
        }
    }
}

fn invalid(message: &str) -> WatchError {
    WatchError::Config(config::ConfigError::Message(message.to_string()))
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:107.0) Gecko/20100101 Firefox/107.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:107.0) Gecko/20100101 Firefox/107.0",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

/// Graphics card listings watched when no sources are configured.
pub fn builtin_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "newegg".to_string(),
            url: "https://www.newegg.ca/p/pl?N=100007708%20601359415%20601357250%20601357247%208000&Order=1".to_string(),
            list_selector: ".items-grid-view".to_string(),
            link_selector: ".item-container > .item-info > .item-title".to_string(),
            stock_selector: ".item-promo".to_string(),
            stock_rule: StockRule {
                in_stock_when: StockMatch::NotEquals,
                text: "OUT OF STOCK".to_string(),
            },
            link_rewrite: None,
            poll_interval_seconds: None,
        },
        SourceConfig {
            name: "canadacomputers".to_string(),
            url: "https://www.canadacomputers.com/index.php?cPath=43&sf=:3_5,3_6,3_7&mfr=&pr=".to_string(),
            list_selector: "div[id='product-list']".to_string(),
            link_selector: ".productTemplate_title > a".to_string(),
            stock_selector: "button".to_string(),
            stock_rule: StockRule {
                in_stock_when: StockMatch::Equals,
                text: "Add to Cart".to_string(),
            },
            link_rewrite: Some(LinkRewrite {
                strip_pattern: Some("&sid=.+$".to_string()),
                base_url: None,
            }),
            poll_interval_seconds: None,
        },
        SourceConfig {
            name: "amazon".to_string(),
            url: "https://www.amazon.ca/s?i=electronics&bbn=677243011&rh=n%3A677243011%2Cp_6%3AA3DWYIK6Y9EEQB%2Cp_36%3A60000-&dc&qid=1631712885&rnid=12035759011&ref=sr_nr_p_36_5".to_string(),
            list_selector: ".s-search-results".to_string(),
            link_selector: "h2 > a".to_string(),
            stock_selector: "h2 > a > span".to_string(),
            stock_rule: StockRule {
                in_stock_when: StockMatch::Matches,
                text: "RTX (3060 Ti|3070|3070 Ti|3080)".to_string(),
            },
            link_rewrite: Some(LinkRewrite {
                strip_pattern: Some("/ref=.+$".to_string()),
                base_url: Some("https://www.amazon.ca".to_string()),
            }),
            poll_interval_seconds: None,
        },
    ]
}
