//! Integration tests for the fetch → merge → filter → quiz pipeline over HTTP.
//!
//! Each test starts its own wiremock server acting as the CORS proxy, so
//! every feed request arrives as `GET /raw?url=<feed url>`. Mock `expect`
//! counts are verified when the server drops.

use newsquiz::feed::{Aggregator, FeedSource, HttpTransport};
use newsquiz::pipeline::{self, LoadMode};
use newsquiz::quiz::QuestionKind;
use newsquiz::relevance::Topic;
use newsquiz::storage::MemoryCache;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_A: &str = "https://a.example/rss";
const FEED_B: &str = "https://b.example/rss";
const FEED_C: &str = "https://c.example/atom";

fn rss_a() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Feed A</title>
  <item>
    <title>Jubilee line strike ends</title>
    <link>https://a.example/1</link>
    <pubDate>Mon, 13 Oct 2025 08:00:00 GMT</pubDate>
    <description>&lt;p&gt;Services resume &lt;b&gt;across London&lt;/b&gt;&lt;/p&gt;</description>
  </item>
  <item>
    <title>Croydon tram works</title>
    <link>https://a.example/2</link>
    <pubDate>Sat, 11 Oct 2025 08:00:00 GMT</pubDate>
  </item>
</channel></rss>"#
        .to_string()
}

fn atom_c() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>Feed C</title>
  <entry>
    <title>Heathrow delays</title>
    <link rel="alternate" href="https://c.example/1"/>
    <updated>2025-10-14T08:00:00Z</updated>
    <summary>Flights held after fog</summary>
  </entry>
  <entry>
    <title>Jubilee line strike ends</title>
    <link href="https://a.example/1"/>
    <updated>2025-10-13T09:00:00Z</updated>
  </entry>
  <entry>
    <title>Kent flood warning</title>
    <link href="https://c.example/3"/>
    <published>2025-10-12T08:00:00Z</published>
  </entry>
</feed>"#
        .to_string()
}

fn sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("Feed A", FEED_A),
        FeedSource::new("Feed B", FEED_B),
        FeedSource::new("Feed C", FEED_C),
    ]
}

async fn mount_feed(server: &MockServer, feed_url: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/raw"))
        .and(query_param("url", feed_url))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

/// A: 2 items, B: HTTP 503, C: 3 items (one duplicate of A's).
async fn three_feed_server(calls: u64) -> MockServer {
    let server = MockServer::start().await;
    mount_feed(&server, FEED_A, ResponseTemplate::new(200).set_body_string(rss_a()), calls).await;
    mount_feed(&server, FEED_B, ResponseTemplate::new(503), calls).await;
    mount_feed(&server, FEED_C, ResponseTemplate::new(200).set_body_string(atom_c()), calls).await;
    server
}

fn aggregator(server: &MockServer) -> Aggregator {
    let transport = HttpTransport::new(reqwest::Client::new(), Some(format!("{}/raw", server.uri())));
    Aggregator::new(Arc::new(transport), Arc::new(MemoryCache::new()), sources())
}

fn titles(items: &[newsquiz::feed::NewsItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_three_feeds_merge_through_proxy() {
    let server = three_feed_server(1).await;
    let feed = aggregator(&server).load().await;

    assert_eq!(
        titles(&feed.items),
        vec![
            "Heathrow delays",
            "Jubilee line strike ends",
            "Kent flood warning",
            "Croydon tram works",
        ]
    );
    assert_eq!(feed.total_sources, 3);
    assert_eq!(feed.failed_sources, 1);
    assert!(!feed.from_cache);

    // The duplicate keeps Feed A's copy, raw date text and cleaned snippet
    let jubilee = &feed.items[1];
    assert_eq!(jubilee.source, "Feed A");
    assert_eq!(jubilee.published_at, "Mon, 13 Oct 2025 08:00:00 GMT");
    assert_eq!(jubilee.snippet, "Services resume across London");
    assert_eq!(feed.items[0].link, "https://c.example/1");
}

#[tokio::test]
async fn test_warm_cache_issues_no_requests() {
    // Each feed may be requested once across both loads
    let server = three_feed_server(1).await;
    let aggregator = aggregator(&server);

    let first = aggregator.load().await;
    let second = aggregator.load().await;

    assert!(second.from_cache);
    assert_eq!(second.failed_sources, 0);
    assert_eq!(second.items, first.items);
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let server = three_feed_server(2).await;
    let aggregator = aggregator(&server);

    aggregator.load().await;
    let refreshed = aggregator.refresh().await;

    assert!(!refreshed.from_cache);
    assert_eq!(refreshed.items.len(), 4);
}

#[tokio::test]
async fn test_slow_feed_times_out_without_blocking_others() {
    let server = MockServer::start().await;
    mount_feed(&server, FEED_A, ResponseTemplate::new(200).set_body_string(rss_a()), 1).await;
    mount_feed(
        &server,
        FEED_B,
        ResponseTemplate::new(200)
            .set_body_string(rss_a())
            .set_delay(Duration::from_secs(10)),
        1,
    )
    .await;
    mount_feed(&server, FEED_C, ResponseTemplate::new(200).set_body_string(atom_c()), 1).await;

    let feed = aggregator(&server)
        .with_fetch_timeout(Duration::from_millis(300))
        .load()
        .await;

    assert_eq!(feed.failed_sources, 1);
    assert_eq!(feed.items.len(), 4);
}

#[tokio::test]
async fn test_garbage_body_counts_as_failed_source() {
    let server = MockServer::start().await;
    mount_feed(&server, FEED_A, ResponseTemplate::new(200).set_body_string("<html>blocked</html>"), 1).await;
    mount_feed(&server, FEED_B, ResponseTemplate::new(404), 1).await;
    mount_feed(&server, FEED_C, ResponseTemplate::new(200).set_body_string(atom_c()), 1).await;

    let feed = aggregator(&server).load().await;

    assert_eq!(feed.failed_sources, 2);
    assert_eq!(
        titles(&feed.items),
        vec!["Heathrow delays", "Jubilee line strike ends", "Kent flood warning"]
    );
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_pipeline_filters_topic_and_reports_status() {
    let server = three_feed_server(1).await;
    let aggregator = aggregator(&server);
    let mut rng = StdRng::seed_from_u64(11);

    let run = pipeline::run(
        &aggregator,
        Topic::Transport,
        LoadMode::PreferCache,
        chrono::Utc::now(),
        &mut rng,
    )
    .await;

    // Heathrow delays + Jubilee line strike ends
    assert_eq!(run.relevant_items, 2);
    assert!(!run.quiz.is_empty());
    assert!(run.quiz.len() <= 4);
    assert!(run
        .quiz
        .iter()
        .take_while(|q| q.kind() == QuestionKind::RealVsFake)
        .count()
        >= 1);
    assert_eq!(
        run.status_line(),
        format!(
            "Loaded 2 TRANSPORT items (1 of 3 feeds unavailable). Quiz ready: {} questions.",
            run.quiz.len()
        )
    );
}

#[tokio::test]
async fn test_pipeline_no_relevant_items() {
    let server = three_feed_server(1).await;
    let aggregator = aggregator(&server);
    let mut rng = StdRng::seed_from_u64(3);

    let run = pipeline::run(
        &aggregator,
        Topic::Health,
        LoadMode::PreferCache,
        chrono::Utc::now(),
        &mut rng,
    )
    .await;

    assert_eq!(run.relevant_items, 0);
    assert!(run.quiz.is_empty());
    assert_eq!(
        run.status_line(),
        "No relevant HEALTH items found (1 of 3 feeds unavailable). Try another topic or refresh later."
    );
}

#[tokio::test]
async fn test_pipeline_every_feed_down() {
    let server = MockServer::start().await;
    for url in [FEED_A, FEED_B, FEED_C] {
        mount_feed(&server, url, ResponseTemplate::new(500), 1).await;
    }
    let mut rng = StdRng::seed_from_u64(0);

    let run = pipeline::run(
        &aggregator(&server),
        Topic::All,
        LoadMode::Refresh,
        chrono::Utc::now(),
        &mut rng,
    )
    .await;

    assert!(run.feed.items.is_empty());
    assert!(run.quiz.is_empty());
    assert_eq!(
        run.status_line(),
        "No relevant ALL items found (3 of 3 feeds unavailable). Try another topic or refresh later."
    );
}
