use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured syndication source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name, used as the item's `source` and as the answer to
    /// source-attribution questions.
    pub name: String,
    /// Feed URL (fetched through the proxy when one is configured).
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One article extracted from a feed.
///
/// Two items with the same `(link, title)` are the same article regardless
/// of which feed carried them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub link: String,
    /// Date text exactly as the feed published it (trimmed).
    pub published_at: String,
    /// Description with markup stripped and whitespace collapsed.
    pub snippet: String,
}

impl NewsItem {
    /// Dedup key identifying the article across feeds.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.link, &self.title)
    }

    /// Parsed publish date, `None` when the feed's date text is missing or
    /// in a format we don't recognise.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_at)
    }

    /// Unix timestamp used for recency ordering; unparseable dates sort as 0.
    pub fn sort_timestamp(&self) -> i64 {
        self.published().map(|dt| dt.timestamp()).unwrap_or(0)
    }

    /// Title and snippet joined for keyword matching.
    pub(crate) fn headline_text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }
}

/// Parses the date formats seen in RSS and Atom feeds.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (Atom, `dc:date`), and two naive
/// forms which are assumed to be UTC.
pub fn parse_published(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
