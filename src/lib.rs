pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod scheduler;
pub mod watcher;

use std::sync::Arc;
use cache::FeedCache;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<FeedCache>,
}
