use crate::util::validate_url;

use super::model::{Document, Outline};

/// A feed subscription extracted from an outline tree.
///
/// Any outline carrying an `xmlUrl` attribute is a candidate, whatever
/// its nesting depth; category outlines without one are traversed but
/// produce nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Display title: `title` attribute, falling back to `text`, then to
    /// the feed URL itself.
    pub title: String,
    /// URL of the RSS/Atom XML. Validated to be HTTP(S) and not pointing
    /// at localhost or private ranges.
    pub xml_url: String,
    /// Website URL from `htmlUrl`, if present and valid.
    pub html_url: Option<String>,
}

/// Collect feed subscriptions from a parsed document.
///
/// Feeds with invalid URLs (localhost, private IPs, non-HTTP schemes)
/// are skipped with a warning rather than failing the import.
pub fn feeds(doc: &Document) -> Vec<Feed> {
    let mut found = Vec::new();
    collect(doc.outlines(), &mut found);
    found
}

fn collect(nodes: &[Outline], out: &mut Vec<Feed>) {
    for node in nodes {
        if let Some(feed) = feed_from_outline(node) {
            out.push(feed);
        }
        collect(node.children(), out);
    }
}

fn feed_from_outline(node: &Outline) -> Option<Feed> {
    let xml_url = node.attr("xmlUrl")?;
    if let Err(e) = validate_url(xml_url) {
        tracing::warn!(url = %xml_url, error = %e, "Skipping invalid feed URL");
        return None;
    }

    let html_url = node.attr("htmlUrl").and_then(|url| match validate_url(url) {
        Ok(_) => Some(url.to_owned()),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Ignoring invalid htmlUrl");
            None
        }
    });

    let title = node
        .attr("title")
        .or_else(|| node.attr("text"))
        .unwrap_or(xml_url);

    Some(Feed {
        title: title.to_owned(),
        xml_url: xml_url.to_owned(),
        html_url,
    })
}
