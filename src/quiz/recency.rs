use chrono::{DateTime, Utc};

/// Answer labels for "roughly when was this published?", newest first.
pub const RECENCY_LABELS: [&str; 5] = [
    "Today",
    "Yesterday",
    "In the last 3 days",
    "In the last week",
    "In the last month",
];

/// Buckets an item's age into one of [`RECENCY_LABELS`].
///
/// Age is counted in whole elapsed days (floor). Future dates and anything
/// under 24 hours are "Today"; anything older than a week falls into the
/// last bucket regardless of how old it really is.
pub fn recency_bucket(published: DateTime<Utc>, now: DateTime<Utc>) -> &'static str {
    let days = (now - published).num_seconds().div_euclid(86_400);
    match days {
        d if d <= 0 => RECENCY_LABELS[0],
        1 => RECENCY_LABELS[1],
        d if d <= 3 => RECENCY_LABELS[2],
        d if d <= 7 => RECENCY_LABELS[3],
        _ => RECENCY_LABELS[4],
    }
}
