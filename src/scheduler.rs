//! Drives refresh cycles from the TTL timer and from configuration changes.
//!
//! Both loops call [`Refresher::refresh`] independently and may overlap;
//! whichever cycle finishes last owns the cache.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aggregator::aggregate;
use crate::cache::FeedCache;
use crate::config::{ConfigOrigin, ConfigStore};
use crate::error::{AppError, Result};
use crate::fetcher::FeedFetcher;
use crate::watcher::{self, WatchEvents};

/// Editors typically emit this many write events per save.
const WRITES_PER_SAVE: u8 = 2;

/// Counts write notifications and fires on every second one.
///
/// The count carries over between saves: N writes fire N / 2 times and leave
/// N % 2 pending.
#[derive(Debug, Default)]
pub struct WriteDebouncer {
    writes: u8,
}

impl WriteDebouncer {
    /// Record one write; `true` when a reload should happen.
    pub fn record_write(&mut self) -> bool {
        self.writes += 1;
        if self.writes == WRITES_PER_SAVE {
            self.writes = 0;
            return true;
        }
        false
    }

    pub fn pending(&self) -> u8 {
        self.writes
    }
}

pub struct Refresher {
    config: Arc<ConfigStore>,
    cache: Arc<FeedCache>,
    fetcher: Arc<dyn FeedFetcher>,
}

impl Refresher {
    pub fn new(
        config: Arc<ConfigStore>,
        cache: Arc<FeedCache>,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            config,
            cache,
            fetcher,
        }
    }

    /// Fetch everything the current configuration names and install the
    /// result. Returns the number of cached items.
    pub async fn refresh(&self) -> usize {
        let config = self.config.snapshot();
        info!("filling cache from {} feeds", config.feeds.len());

        let result = aggregate(&config, &self.fetcher).await;
        let count = result.items.len();
        self.cache.replace(result.items);

        info!(
            "cache filled: {} items, {} failed fetches",
            count,
            result.failures.len()
        );
        count
    }

    /// Refresh every TTL for the life of the process. The TTL is re-read
    /// from the configuration before each wait, and a slow refresh pushes
    /// the next one back.
    pub async fn run_ttl(&self) {
        loop {
            let ttl = self.config.snapshot().cache_ttl();
            debug!("next cache eviction in {}s", ttl.as_secs());
            tokio::time::sleep(ttl).await;

            info!("evicting cache");
            self.refresh().await;
        }
    }

    /// Replace the whole configuration from `origin`. On error the current
    /// configuration is left alone.
    pub async fn reload(&self, origin: &ConfigOrigin) -> Result<()> {
        let origin = origin.clone();
        let next = tokio::task::spawn_blocking(move || origin.load())
            .await
            .map_err(|e| AppError::ConfigError(format!("reload task failed: {}", e)))??;
        let current = self.config.snapshot();
        if next.end_point != current.end_point {
            warn!(
                "endPoint changed to {:?}; still listening on {:?} until restart",
                next.end_point, current.end_point
            );
        }
        self.config.replace(next);
        Ok(())
    }

    /// Reload and refresh on every second write to the configuration file.
    /// Returns once the watcher's event stream closes.
    pub async fn run_config_watch(&self, origin: ConfigOrigin, mut events: WatchEvents) {
        let mut debouncer = WriteDebouncer::default();

        while let Some(event) = events.recv().await {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!("config watcher error: {}", err);
                    continue;
                }
            };
            if !watcher::is_write(&event) || !debouncer.record_write() {
                continue;
            }

            info!("modified file: {:?}", event.paths);
            match self.reload(&origin).await {
                Ok(()) => {
                    self.refresh().await;
                }
                Err(err) => warn!("keeping previous configuration, reload failed: {}", err),
            }
        }
        debug!("config watcher closed, no further reloads");
    }
}
