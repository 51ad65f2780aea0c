use async_trait::async_trait;

use crate::error::Result;

/// Retrieves the raw HTML of a listing page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}
