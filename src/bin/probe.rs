use anyhow::Result;
use tracing::error;

use stock_watch::utils::http::HttpFetcher;
use stock_watch::{Config, PageFetcher, WatchedSource};

/// Fetch every configured source once and print what the selectors extract.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stock_watch=info".parse()?),
        )
        .init();

    let config = Config::load()?;
    let fetcher = HttpFetcher::from_config(&config)?;

    for source in WatchedSource::from_config(&config)? {
        let spec = &source.spec;
        println!("== {} ({})", spec.name, spec.url);

        let body = match fetcher.fetch(&spec.url).await {
            Ok(body) => body,
            Err(e) => {
                error!("Could not fetch {}: {}", spec.url, e);
                continue;
            }
        };

        let records = spec.extract_from_html(&body);
        println!("Found {} entries", records.len());
        for record in records {
            let marker = if record.in_stock { "IN " } else { "OUT" };
            println!("  [{}] {} -> {}", marker, record.title, record.link);
        }
        println!();
    }

    Ok(())
}
