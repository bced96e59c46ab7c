use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::feed::fetcher::{fetch_feed_with_timeout, FeedTransport};
use crate::feed::types::{FeedSource, NewsItem};
use crate::storage::FeedCache;

/// Key the merged feed is cached under.
pub const FEED_CACHE_KEY: &str = "newsquiz_feedcache_v1";

/// Default time-to-live of the cached feed (6 hours)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Default per-feed timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Default number of fetches in flight at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Merged, deduplicated, recency-sorted items plus how they were obtained.
#[derive(Debug, Clone, Default)]
pub struct AggregatedFeed {
    pub items: Vec<NewsItem>,
    /// Number of configured sources
    pub total_sources: usize,
    /// Sources that failed during this refresh (always 0 for a cache hit)
    pub failed_sources: usize,
    /// True when `items` came from a fresh cache entry without network calls
    pub from_cache: bool,
}

impl AggregatedFeed {
    pub fn is_degraded(&self) -> bool {
        self.failed_sources > 0
    }
}

/// Fetches all configured feeds, merges them and caches the result.
///
/// Holds the transport and cache capabilities explicitly; nothing is global.
pub struct Aggregator {
    transport: Arc<dyn FeedTransport>,
    cache: Arc<dyn FeedCache>,
    sources: Vec<FeedSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    max_concurrent: usize,
}

impl Aggregator {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        cache: Arc<dyn FeedCache>,
        sources: Vec<FeedSource>,
    ) -> Self {
        Self {
            transport,
            cache,
            sources,
            ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Returns the merged feed, preferring a fresh cache entry.
    ///
    /// A non-expired, decodable cache entry is returned as-is and no fetch
    /// is issued. Otherwise every source is fetched and the result is
    /// written back with the configured TTL.
    pub async fn load(&self) -> AggregatedFeed {
        if let Some(items) = self.read_cache().await {
            tracing::debug!(items = items.len(), "Serving feed from cache");
            return AggregatedFeed {
                items,
                total_sources: self.sources.len(),
                failed_sources: 0,
                from_cache: true,
            };
        }
        self.refresh().await
    }

    /// Fetches every source regardless of the cache, then caches the result.
    pub async fn refresh(&self) -> AggregatedFeed {
        let total = self.sources.len();
        let transport = self.transport.as_ref();
        let timeout = self.fetch_timeout;

        // buffered() keeps source order so dedup keeps the earliest source's copy
        let outcomes: Vec<_> = stream::iter(self.sources.iter())
            .map(|source| async move {
                let result = fetch_feed_with_timeout(transport, source, timeout).await;
                (source, result)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut failed = 0usize;
        let mut lists = Vec::with_capacity(total);
        for (source, result) in outcomes {
            match result {
                Ok(items) => lists.push(items),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(feed = %source.name, url = %source.url, error = %e, "Feed unavailable, skipping");
                }
            }
        }

        let items = merge_feeds(lists);
        tracing::info!(
            items = items.len(),
            sources = total,
            failed = failed,
            "Feeds refreshed"
        );

        self.write_cache(&items).await;

        AggregatedFeed {
            items,
            total_sources: total,
            failed_sources: failed,
            from_cache: false,
        }
    }

    /// Reads the cached list. Any failure, expiry, or undecodable value is a miss.
    async fn read_cache(&self) -> Option<Vec<NewsItem>> {
        let entry = match self.cache.get(FEED_CACHE_KEY).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Feed cache read failed, treating as cold start");
                return None;
            }
        };

        if entry.is_expired_at(Utc::now()) {
            tracing::debug!(expired_at = %entry.expires_at, "Cached feed expired");
            if let Err(e) = self.cache.remove(FEED_CACHE_KEY).await {
                tracing::warn!(error = %e, "Failed to remove expired feed cache entry");
            }
            return None;
        }

        match serde_json::from_str(&entry.value) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(error = %e, "Cached feed is unreadable, refetching");
                None
            }
        }
    }

    /// Best-effort write; failures are logged and dropped.
    async fn write_cache(&self, items: &[NewsItem]) {
        let value = match serde_json::to_string(items) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode feed for cache");
                return;
            }
        };
        if let Err(e) = self.cache.set(FEED_CACHE_KEY, &value, self.ttl).await {
            tracing::warn!(error = %e, "Failed to write feed cache");
        }
    }
}

/// Concatenates per-source item lists in order, drops repeated
/// `(link, title)` pairs (first occurrence wins), and sorts newest first.
///
/// The sort is stable, so items with equal or unparseable dates keep their
/// merge order; unparseable dates count as the Unix epoch.
pub fn merge_feeds(lists: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let all: Vec<NewsItem> = lists.into_iter().flatten().collect();
    let first_seen: Vec<bool> = {
        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(all.len());
        all.iter().map(|item| seen.insert(item.dedup_key())).collect()
    };

    let mut merged: Vec<NewsItem> = all
        .into_iter()
        .zip(first_seen)
        .filter_map(|(item, first)| first.then_some(item))
        .collect();

    merged.sort_by_cached_key(|item| std::cmp::Reverse(item.sort_timestamp()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::fetcher::FetchError;
    use crate::storage::{CacheEntry, CacheError, MemoryCache};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(source: &str, title: &str, link: &str, date: &str) -> NewsItem {
        NewsItem {
            source: source.into(),
            title: title.into(),
            link: link.into(),
            published_at: date.into(),
            snippet: String::new(),
        }
    }

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, date)| {
                format!("<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate></item>")
            })
            .collect();
        format!("<rss version=\"2.0\"><channel>{body}</channel></rss>")
    }

    /// Serves canned bodies by URL and counts calls; unknown URLs fail.
    #[derive(Default)]
    struct ScriptedTransport {
        bodies: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn with(mut self, url: &str, body: String) -> Self {
            self.bodies.insert(url.to_string(), body);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedTransport for ScriptedTransport {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .cloned()
                .ok_or(FetchError::HttpStatus(503))
        }
    }

    /// A cache whose every operation fails, like a full or missing store.
    struct BrokenCache;

    #[async_trait]
    impl FeedCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
    }

    fn three_feed_transport() -> ScriptedTransport {
        ScriptedTransport::default()
            .with(
                "https://a.example/rss",
                rss(&[
                    ("Tube strike ends", "https://a.example/1", "Mon, 13 Oct 2025 08:00:00 GMT"),
                    ("Croydon tram works", "https://a.example/2", "Sat, 11 Oct 2025 08:00:00 GMT"),
                ]),
            )
            .with(
                "https://c.example/rss",
                rss(&[
                    ("Heathrow delays", "https://c.example/1", "Tue, 14 Oct 2025 08:00:00 GMT"),
                    ("Tube strike ends", "https://a.example/1", "Mon, 13 Oct 2025 09:00:00 GMT"),
                    ("Kent flood warning", "https://c.example/3", "Sun, 12 Oct 2025 08:00:00 GMT"),
                ]),
            )
    }

    fn three_sources() -> Vec<FeedSource> {
        vec![
            FeedSource::new("Feed A", "https://a.example/rss"),
            FeedSource::new("Feed B", "https://b.example/rss"),
            FeedSource::new("Feed C", "https://c.example/rss"),
        ]
    }

    #[test]
    fn test_merge_dedups_by_link_and_title() {
        let merged = merge_feeds(vec![
            vec![item("A", "Same", "https://x/1", "")],
            vec![
                item("B", "Same", "https://x/1", ""),
                item("B", "Same", "https://x/2", ""),
                item("B", "Other", "https://x/1", ""),
            ],
        ]);
        assert_eq!(merged.len(), 3);
        // First occurrence (source A) is the one kept
        assert_eq!(merged[0].source, "A");
        let keys: HashSet<(&str, &str)> = merged.iter().map(NewsItem::dedup_key).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&("https://x/1", "Other")));
    }

    #[test]
    fn test_merge_sorts_newest_first_with_bad_dates_last() {
        let merged = merge_feeds(vec![vec![
            item("A", "old", "1", "2025-01-01T00:00:00Z"),
            item("A", "garbage", "2", "not a date"),
            item("A", "new", "3", "2025-06-01T00:00:00Z"),
            item("A", "empty", "4", ""),
        ]]);
        let titles: Vec<_> = merged.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "garbage", "empty"]);
    }

    #[tokio::test]
    async fn test_partial_failure_scenario() {
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(
            transport.clone(),
            Arc::new(MemoryCache::new()),
            three_sources(),
        );

        let feed = aggregator.load().await;
        assert_eq!(transport.calls(), 3);
        assert_eq!(feed.total_sources, 3);
        assert_eq!(feed.failed_sources, 1);
        assert!(!feed.from_cache);

        let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Heathrow delays",
                "Tube strike ends",
                "Kent flood warning",
                "Croydon tram works"
            ]
        );
        // The duplicate kept feed A's copy
        assert_eq!(feed.items[1].source, "Feed A");
    }

    #[tokio::test]
    async fn test_warm_cache_issues_no_fetches() {
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(
            transport.clone(),
            Arc::new(MemoryCache::new()),
            three_sources(),
        );

        let first = aggregator.load().await;
        let calls_after_first = transport.calls();
        let second = aggregator.load().await;

        assert_eq!(transport.calls(), calls_after_first);
        assert!(second.from_cache);
        assert_eq!(first.items, second.items);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(
            transport.clone(),
            Arc::new(MemoryCache::new()),
            three_sources(),
        )
        .with_ttl(Duration::ZERO);

        aggregator.load().await;
        let second = aggregator.load().await;
        assert_eq!(transport.calls(), 6);
        assert!(!second.from_cache);
    }

    #[tokio::test]
    async fn test_unreadable_cache_value_is_a_miss() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set(FEED_CACHE_KEY, "{not json", Duration::from_secs(60))
            .await
            .unwrap();
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(transport.clone(), cache, three_sources());

        let feed = aggregator.load().await;
        assert_eq!(transport.calls(), 3);
        assert_eq!(feed.items.len(), 4);
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_cold_start() {
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(transport.clone(), Arc::new(BrokenCache), three_sources());

        let first = aggregator.load().await;
        let second = aggregator.load().await;
        assert_eq!(first.items.len(), 4);
        assert_eq!(second.items.len(), 4);
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn test_total_failure_is_empty_not_error() {
        let transport = Arc::new(ScriptedTransport::default());
        let aggregator = Aggregator::new(
            transport.clone(),
            Arc::new(MemoryCache::new()),
            three_sources(),
        );

        let feed = aggregator.load().await;
        assert!(feed.items.is_empty());
        assert_eq!(feed.failed_sources, 3);
        assert!(feed.is_degraded());
    }

    #[tokio::test]
    async fn test_refresh_bypasses_warm_cache() {
        let transport = Arc::new(three_feed_transport());
        let aggregator = Aggregator::new(
            transport.clone(),
            Arc::new(MemoryCache::new()),
            three_sources(),
        );

        aggregator.load().await;
        let refreshed = aggregator.refresh().await;
        assert_eq!(transport.calls(), 6);
        assert!(!refreshed.from_cache);
    }

    #[tokio::test]
    async fn test_unparseable_feed_counts_as_failure() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with("https://a.example/rss", "<html>Blocked</html>".into()),
        );
        let aggregator = Aggregator::new(
            transport,
            Arc::new(MemoryCache::new()),
            vec![FeedSource::new("Feed A", "https://a.example/rss")],
        );

        let feed = aggregator.load().await;
        assert_eq!(feed.failed_sources, 1);
        assert!(feed.items.is_empty());
    }
}
