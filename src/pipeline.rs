//! Load, filter and generate in one pass.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::feed::{AggregatedFeed, Aggregator};
use crate::quiz::{generate_quiz, QuizSet};
use crate::relevance::{filter_items, Topic};

/// Everything one run of the pipeline produced.
#[derive(Debug, Clone)]
pub struct QuizRun {
    pub topic: Topic,
    pub feed: AggregatedFeed,
    /// Items left after the region and topic filters
    pub relevant_items: usize,
    pub quiz: QuizSet,
}

impl QuizRun {
    /// The single user-visible summary line.
    pub fn status_line(&self) -> String {
        status_line(self.topic, &self.feed, self.relevant_items, self.quiz.len())
    }
}

/// How the aggregator should treat its cache for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    PreferCache,
    /// Skip the cache read; the result is still written back
    Refresh,
}

/// Fetches (or reads cached) items, narrows them to `topic` and builds a quiz.
///
/// Never fails: feed and cache failures are already absorbed by the
/// aggregator and show up as a degraded [`AggregatedFeed`].
pub async fn run<R: Rng + ?Sized>(
    aggregator: &Aggregator,
    topic: Topic,
    mode: LoadMode,
    now: DateTime<Utc>,
    rng: &mut R,
) -> QuizRun {
    let feed = match mode {
        LoadMode::PreferCache => aggregator.load().await,
        LoadMode::Refresh => aggregator.refresh().await,
    };

    let relevant = filter_items(&feed.items, topic);
    tracing::info!(
        topic = %topic,
        merged = feed.items.len(),
        relevant = relevant.len(),
        failed_sources = feed.failed_sources,
        from_cache = feed.from_cache,
        "Feed loaded"
    );

    let quiz = generate_quiz(&relevant, now, rng);
    tracing::debug!(questions = quiz.len(), "Quiz generated");

    QuizRun {
        topic,
        relevant_items: relevant.len(),
        feed,
        quiz,
    }
}

/// Formats the summary status.
///
/// Failed sources are counted, never named, and the count only appears when
/// at least one source failed.
pub fn status_line(
    topic: Topic,
    feed: &AggregatedFeed,
    relevant_items: usize,
    questions: usize,
) -> String {
    let topic = topic.as_str().to_uppercase();
    let unavailable = if feed.is_degraded() {
        format!(
            " ({} of {} feeds unavailable)",
            feed.failed_sources, feed.total_sources
        )
    } else {
        String::new()
    };

    if relevant_items == 0 {
        return format!(
            "No relevant {topic} items found{unavailable}. Try another topic or refresh later."
        );
    }

    format!(
        "Loaded {relevant_items} {topic} items{unavailable}. Quiz ready: {questions} questions."
    )
}
