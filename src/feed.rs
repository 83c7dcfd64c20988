//! Feed items and the RSS wire format.
//!
//! Upstream feeds and the served document share one schema: an `<rss>` root
//! with a `<channel>` holding `<item>`s, of which only `<title>` and `<link>`
//! are kept.

use crate::error::Result;

/// Version attribute written on the served `<rss>` root.
pub const SCHEMA_VERSION: &str = "2.0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }

    fn from_rss(item: &rss::Item) -> Self {
        Self {
            title: item.title().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
        }
    }

    fn to_rss(&self) -> rss::Item {
        rss::Item {
            title: Some(self.title.clone()),
            link: Some(self.link.clone()),
            ..Default::default()
        }
    }
}

/// Decode a fetched response body into its items, in document order.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedItem>> {
    let channel = rss::Channel::read_from(body)?;
    Ok(channel.items().iter().map(FeedItem::from_rss).collect())
}

/// Encode items as a complete RSS document.
pub fn write_feed(items: &[FeedItem]) -> Result<Vec<u8>> {
    let channel = rss::Channel {
        items: items.iter().map(FeedItem::to_rss).collect(),
        ..Default::default()
    };
    Ok(channel.write_to(Vec::new())?)
}
