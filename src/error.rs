use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch of {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Poll cycle panicked: {0}")]
    Panicked(String),

    #[error("Record channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, WatchError>;
