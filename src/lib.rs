pub mod aggregator;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod utils;

pub use aggregator::{Aggregator, AvailabilityState, Transition};
pub use config::Config;
pub use error::{Result, WatchError};
pub use extraction::ExtractionSpec;
pub use fetcher::PageFetcher;
pub use models::{AvailabilityRecord, ProductLink};
pub use monitor::{Monitor, MonitorHandle, MonitorSettings, WatchedSource};
pub use notify::Notifier;
pub use poller::Poller;
