use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::feed::{self, FeedItem, SCHEMA_VERSION};

/// One complete result of a refresh cycle.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub version: &'static str,
    pub items: Vec<FeedItem>,
    /// `None` until the first refresh installs a snapshot.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            items: Vec::new(),
            refreshed_at: None,
        }
    }

    fn new(items: Vec<FeedItem>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            items,
            refreshed_at: Some(Utc::now()),
        }
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        feed::write_feed(&self.items)
    }
}

/// Merged items shared between refresh cycles and request handlers.
///
/// `replace` swaps the whole snapshot in one store, so a reader holding the
/// `Arc` from `read` keeps seeing that snapshot even while newer ones land.
/// Concurrent replaces are last-writer-wins.
pub struct FeedCache {
    current: ArcSwap<CacheSnapshot>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(CacheSnapshot::empty()),
        }
    }

    pub fn replace(&self, items: Vec<FeedItem>) {
        self.current.store(Arc::new(CacheSnapshot::new(items)));
    }

    pub fn read(&self) -> Arc<CacheSnapshot> {
        self.current.load_full()
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}
