use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::feed::{self, FeedItem};

/// Result of fetching one address: its items, or why there are none.
pub type FetchOutcome = Result<Vec<FeedItem>>;

// Shared so that fetches of the same host reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client")
});

/// Retrieves and decodes one feed address.
///
/// Called concurrently from many tasks within a refresh cycle, so
/// implementations must not keep per-call mutable state.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Fetches over HTTP. No retries: a failed address simply yields no items
/// until the next refresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        debug!("fetching {}", url);
        let response = CLIENT.get(url).send().await?;
        let body = response.bytes().await?;
        feed::parse_feed(&body)
    }
}
