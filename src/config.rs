//! Configuration file parser for ~/.config/newsquiz/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`,
//! which quizzes on the built-in London and South-East feeds. Unknown keys
//! are accepted but logged, since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{FeedSource, DEFAULT_PROXY_URL};
use crate::relevance::Topic;
use crate::util::{validate_proxy_url, validate_url};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid proxy_url '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },
}

// ============================================================================
// Default Feeds
// ============================================================================

const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("BBC London", "https://feeds.bbci.co.uk/news/england/london/rss.xml"),
    ("BBC UK", "https://feeds.bbci.co.uk/news/uk/rss.xml"),
    ("Evening Standard", "https://www.standard.co.uk/news/rss"),
    ("TfL News", "https://tfl.gov.uk/info-for/media/press-releases/rss"),
    ("Met Police News", "https://news.met.police.uk/rss/news"),
    ("London.gov.uk News", "https://www.london.gov.uk/feeds/news.xml"),
    ("Kent Live", "https://www.kentlive.news/news/?service=rss"),
    ("Surrey Live", "https://www.getsurrey.co.uk/news/?service=rss"),
    ("Sussex World", "https://www.sussexexpress.co.uk/rss"),
    ("Essex Live", "https://www.essexlive.news/news/?service=rss"),
    ("Hampshire Live", "https://www.hampshirelive.news/news/?service=rss"),
    ("Oxford Mail", "https://www.oxfordmail.co.uk/news/rss/"),
    ("Berkshire Live", "https://www.getreading.co.uk/news/?service=rss"),
    ("Bucks Free Press", "https://www.bucksfreepress.co.uk/news/rss/"),
];

/// The built-in feed list.
pub fn default_feeds() -> Vec<FeedSource> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, url)| FeedSource::new(*name, *url))
        .collect()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topic selector ("all", "transport", ...). Unknown values mean "all".
    pub topic: String,

    /// CORS-style proxy the feeds are fetched through. Empty string fetches
    /// feeds directly.
    pub proxy_url: String,

    /// How long a merged feed stays in the cache.
    pub cache_ttl_hours: u64,

    /// Per-feed timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// Maximum number of feeds fetched at once.
    pub max_concurrent_fetches: usize,

    /// Feed list; replaces the built-in list when non-empty.
    pub feeds: Vec<FeedSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: Topic::All.as_str().to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            cache_ttl_hours: 6,
            fetch_timeout_secs: 20,
            max_concurrent_fetches: 16,
            feeds: default_feeds(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "topic",
        "proxy_url",
        "cache_ttl_hours",
        "fetch_timeout_secs",
        "max_concurrent_fetches",
        "feeds",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - `feeds = []` → the built-in feed list
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        if config.feeds.is_empty() {
            config.feeds = default_feeds();
        }
        tracing::info!(
            path = %path.display(),
            topic = %config.topic,
            feeds = config.feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn topic(&self) -> Topic {
        Topic::from_selector(&self.topic)
    }

    /// The validated proxy URL, or `None` when proxying is disabled.
    pub fn proxy(&self) -> Result<Option<String>, ConfigError> {
        let proxy = self.proxy_url.trim();
        if proxy.is_empty() {
            return Ok(None);
        }
        validate_proxy_url(proxy)
            .map(|url| Some(url.to_string()))
            .map_err(|e| ConfigError::InvalidProxy {
                url: proxy.to_string(),
                reason: e.to_string(),
            })
    }

    /// Configured feeds with unusable entries dropped.
    ///
    /// Feeds with a blank name or a URL that fails validation (bad scheme,
    /// localhost, private address) are skipped with a warning.
    pub fn sources(&self) -> Vec<FeedSource> {
        self.feeds
            .iter()
            .filter(|feed| {
                if feed.name.trim().is_empty() {
                    tracing::warn!(url = %feed.url, "Skipping feed with empty name");
                    return false;
                }
                match validate_url(&feed.url) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(feed = %feed.name, url = %feed.url, error = %e, "Skipping feed with invalid URL");
                        false
                    }
                }
            })
            .cloned()
            .collect()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }

    /// Per-feed timeout, at least one second.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================
