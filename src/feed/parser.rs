use anyhow::Result;
use feed_rs::parser;
use serde::{Deserialize, Serialize};

/// A fetched feed, reduced to what the subscription commands need and
/// shaped for JSON (the channel cache stores exactly this).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub title: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub title: String,
    pub link: Option<String>,
    /// Unix timestamp of the published (or updated) date, when present.
    pub published: Option<i64>,
}

/// Parse RSS or Atom bytes into a [`Channel`].
pub fn parse_channel(bytes: &[u8]) -> Result<Channel> {
    let feed = parser::parse(bytes)?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();
    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let published = entry.published.or(entry.updated).map(|dt| dt.timestamp());
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            Item {
                title,
                link,
                published,
            }
        })
        .collect();

    Ok(Channel { title, items })
}
