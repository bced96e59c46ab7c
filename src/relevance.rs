//! Region and topic relevance filtering.
//!
//! Matching is case-insensitive substring search over the item text, so
//! short terms such as `A3` or `GLA` also match inside longer words. That
//! looseness is accepted: the goal is to keep London and South-East stories,
//! not to classify them precisely.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::feed::NewsItem;

/// Maximum number of items handed to the question generator.
pub const MAX_FILTERED_ITEMS: usize = 120;

/// London boroughs, home counties, transport operators, hospitals and roads.
pub const REGION_TERMS: &[&str] = &[
    "Westminster", "Camden", "Islington", "Hackney", "Tower Hamlets", "Southwark", "Lambeth",
    "Wandsworth", "Hammersmith", "Kensington", "Chelsea", "Hillingdon", "Hounslow", "Ealing",
    "Brent", "Harrow", "Barnet", "Enfield", "Waltham Forest", "Redbridge", "Newham", "Barking",
    "Dagenham", "Havering", "Bexley", "Greenwich", "Lewisham", "Bromley", "Croydon", "Sutton",
    "Merton", "Kingston", "Richmond", "Haringey", "City of London", "Kent", "Surrey",
    "East Sussex", "West Sussex", "Essex", "Berkshire", "Buckinghamshire", "Hampshire",
    "Oxfordshire", "TfL", "Transport for London", "Met Police", "GLA", "City Hall", "Heathrow",
    "Gatwick", "Stansted", "Luton", "Thameslink", "Southeastern", "Southern",
    "South Western Railway", "Elizabeth line", "Jubilee line", "Northern line", "DLR",
    "Overground", "ULEZ", "Congestion Charge", "Barts", "UCLH", "Guy’s", "St Thomas’",
    "King’s College Hospital", "M25", "A3", "A2", "A23", "A12",
];

const TRANSPORT_TERMS: &[&str] = &[
    "tube", "rail", "train", "bus", "tfl", "overground", "dlr", "station", "road", "m25",
    "heathrow", "gatwick", "ulez", "strike", "delay", "closure", "fares", "elizabeth line",
];

const HEALTH_TERMS: &[&str] = &[
    "nhs", "hospital", "gp", "clinic", "ambulance", "trust", "covid", "flu", "waiting list",
    "uclh", "barts", "st thomas",
];

const CRIME_TERMS: &[&str] = &[
    "police", "court", "arrest", "charged", "investigation", "murder", "stabbing", "robbery",
    "met police", "appeal",
];

const POLITICS_TERMS: &[&str] = &[
    "mayor", "council", "city hall", "gla", "election", "policy", "budget", "consultation",
    "planning", "housing", "parliament",
];

const BUSINESS_TERMS: &[&str] = &[
    "startup", "tech", "finance", "city", "bank", "retail", "shop", "market", "investment", "jobs",
];

const CULTURE_TERMS: &[&str] = &[
    "museum", "gallery", "theatre", "concert", "festival", "football", "premier league",
    "west end", "film", "exhibition", "sport",
];

const ENVIRONMENT_TERMS: &[&str] = &[
    "weather", "storm", "flood", "heatwave", "environment", "parks", "air quality",
    "river thames", "green",
];

/// Topic selector. `All` performs no narrowing beyond the region filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    #[default]
    All,
    Transport,
    Health,
    Crime,
    Politics,
    Business,
    Culture,
    Environment,
}

impl Topic {
    pub const ALL: [Topic; 8] = [
        Topic::All,
        Topic::Transport,
        Topic::Health,
        Topic::Crime,
        Topic::Politics,
        Topic::Business,
        Topic::Culture,
        Topic::Environment,
    ];

    /// Parses a selector string case-insensitively; unknown selectors mean `All`.
    pub fn from_selector(selector: &str) -> Self {
        let wanted = selector.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or(Topic::All)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::All => "all",
            Topic::Transport => "transport",
            Topic::Health => "health",
            Topic::Crime => "crime",
            Topic::Politics => "politics",
            Topic::Business => "business",
            Topic::Culture => "culture",
            Topic::Environment => "environment",
        }
    }

    /// Keyword vocabulary, `None` for `All`.
    pub fn keywords(&self) -> Option<&'static [&'static str]> {
        match self {
            Topic::All => None,
            Topic::Transport => Some(TRANSPORT_TERMS),
            Topic::Health => Some(HEALTH_TERMS),
            Topic::Crime => Some(CRIME_TERMS),
            Topic::Politics => Some(POLITICS_TERMS),
            Topic::Business => Some(BUSINESS_TERMS),
            Topic::Culture => Some(CULTURE_TERMS),
            Topic::Environment => Some(ENVIRONMENT_TERMS),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive substring match of any term.
pub fn includes_any(text: &str, terms: &[&str]) -> bool {
    let text = text.to_lowercase();
    terms.iter().any(|term| text.contains(&term.to_lowercase()))
}

/// True if title, snippet or source name mention the region.
pub fn is_regional(item: &NewsItem) -> bool {
    let text = format!("{} {} {}", item.title, item.snippet, item.source);
    includes_any(&text, REGION_TERMS)
}

/// True if title or snippet match the topic (always true for `All`).
pub fn matches_topic(item: &NewsItem, topic: Topic) -> bool {
    match topic.keywords() {
        Some(terms) => includes_any(&item.headline_text(), terms),
        None => true,
    }
}

/// Narrows `items` to regional items on `topic`, keeping their order and
/// capping the result at [`MAX_FILTERED_ITEMS`].
pub fn filter_items(items: &[NewsItem], topic: Topic) -> Vec<NewsItem> {
    items
        .iter()
        .filter(|item| is_regional(item) && matches_topic(item, topic))
        .take(MAX_FILTERED_ITEMS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, title: &str, snippet: &str) -> NewsItem {
        NewsItem {
            source: source.into(),
            title: title.into(),
            link: format!("https://example.com/{}", title.len()),
            published_at: String::new(),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn test_topic_from_selector() {
        assert_eq!(Topic::from_selector("transport"), Topic::Transport);
        assert_eq!(Topic::from_selector("  HEALTH "), Topic::Health);
        assert_eq!(Topic::from_selector("all"), Topic::All);
        assert_eq!(Topic::from_selector("astrology"), Topic::All);
        assert_eq!(Topic::from_selector(""), Topic::All);
    }

    #[test]
    fn test_region_matches_title_snippet_or_source() {
        assert!(is_regional(&item("Wire", "Delays in CROYDON", "")));
        assert!(is_regional(&item("Wire", "Delays", "near heathrow terminal 5")));
        assert!(is_regional(&item("Kent Live", "Delays", "")));
        assert!(!is_regional(&item("Wire", "Delays in Leeds", "Yorkshire")));
    }

    #[test]
    fn test_region_terms_with_curly_apostrophes() {
        assert!(is_regional(&item("Wire", "New wing at Guy’s opens", "")));
    }

    #[test]
    fn test_topic_ignores_source_name() {
        // "City Hall" is a politics term, but only title + snippet are checked
        let it = item("City Hall Press", "Camden market reopens", "");
        assert!(is_regional(&it));
        assert!(!matches_topic(&it, Topic::Politics));
        assert!(matches_topic(&it, Topic::Business));
    }

    #[test]
    fn test_filter_applies_region_then_topic() {
        let items = vec![
            item("Wire", "Northern line strike called", ""),
            item("Wire", "Camden festival returns", ""),
            item("Wire", "Rail strike in Manchester", ""),
        ];

        let all = filter_items(&items, Topic::All);
        assert_eq!(all.len(), 2);

        let transport = filter_items(&items, Topic::Transport);
        assert_eq!(transport.len(), 1);
        assert_eq!(transport[0].title, "Northern line strike called");
    }

    #[test]
    fn test_filter_caps_output_and_keeps_order() {
        let items: Vec<_> = (0..200)
            .map(|i| item("Wire", &format!("Croydon story {i}"), ""))
            .collect();
        let filtered = filter_items(&items, Topic::All);
        assert_eq!(filtered.len(), MAX_FILTERED_ITEMS);
        assert_eq!(filtered[0].title, "Croydon story 0");
        assert_eq!(filtered[119].title, "Croydon story 119");
    }

    #[test]
    fn test_filter_empty_input() {
        assert!(filter_items(&[], Topic::Crime).is_empty());
    }
}
