//! One refresh cycle: fetch every filter of every source and merge the items.
//!
//! Sources are handled one after another. Within a source, a fetch is
//! launched per filter in declared order, spaced by the source's rate limit,
//! and the cycle waits for all of them before moving on. Items of a source
//! therefore form one contiguous run in declaration order of the sources,
//! while inside that run they follow completion order.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::config::{Config, FeedSource};
use crate::error::AppError;
use crate::feed::FeedItem;
use crate::fetcher::{FeedFetcher, FetchOutcome};

/// A fetch that contributed nothing to the cycle.
#[derive(Debug)]
pub struct FetchFailure {
    pub url: String,
    pub cause: AppError,
}

#[derive(Debug, Default)]
pub struct Aggregate {
    pub items: Vec<FeedItem>,
    pub failures: Vec<FetchFailure>,
}

/// Run one cycle over `config`. Failed fetches are logged and skipped; the
/// cycle itself never fails.
pub async fn aggregate(config: &Config, fetcher: &Arc<dyn FeedFetcher>) -> Aggregate {
    let mut aggregate = Aggregate::default();
    for source in &config.feeds {
        collect_source(source, fetcher, &mut aggregate).await;
    }
    aggregate
}

async fn collect_source(
    source: &FeedSource,
    fetcher: &Arc<dyn FeedFetcher>,
    aggregate: &mut Aggregate,
) {
    let pause = source.rate_limit();
    let mut pending: JoinSet<(String, FetchOutcome)> = JoinSet::new();

    for (index, url) in source.urls().enumerate() {
        // Paces launches only; responses are not awaited here
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        let fetcher = Arc::clone(fetcher);
        pending.spawn(async move {
            let outcome = fetcher.fetch(&url).await;
            (url, outcome)
        });
    }
    debug!("{}: {} fetches in flight", source.base_url, pending.len());

    while let Some(joined) = pending.join_next().await {
        match joined {
            Ok((_, Ok(items))) => aggregate.items.extend(items),
            Ok((url, Err(cause))) => {
                warn!("skipping {}: {}", url, cause);
                aggregate.failures.push(FetchFailure { url, cause });
            }
            Err(err) => {
                error!("fetch task for {} died: {}", source.base_url, err);
                aggregate.failures.push(FetchFailure {
                    url: source.base_url.clone(),
                    cause: AppError::FetchError(err.to_string()),
                });
            }
        }
    }
}
