//! Feed retrieval and aggregation.
//!
//! - [`parser`] - RSS 2.0 / RSS 1.0 (RDF) / Atom parsing with `quick-xml`
//! - [`fetcher`] - HTTP retrieval through an optional CORS-style proxy
//! - [`aggregator`] - concurrent fetch of every source, merge, dedup and cache
//!
//! # Example
//!
//! ```ignore
//! let transport = Arc::new(HttpTransport::new(client, Some(DEFAULT_PROXY_URL.into())));
//! let aggregator = Aggregator::new(transport, cache, sources);
//! let feed = aggregator.load().await;
//! println!("{} items, {} feeds failed", feed.items.len(), feed.failed_sources);
//! ```

mod aggregator;
mod fetcher;
mod parser;
mod types;

pub use aggregator::{
    merge_feeds, AggregatedFeed, Aggregator, DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MAX_CONCURRENT_FETCHES, FEED_CACHE_KEY,
};
pub use fetcher::{
    build_client, fetch_feed, fetch_feed_with_timeout, FeedTransport, FetchError, HttpTransport,
    DEFAULT_PROXY_URL,
};
pub use parser::{parse_feed, ParseError};
pub use types::{parse_published, FeedSource, NewsItem};
