use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Token vocabularies and sentence templates used to fabricate headlines.
///
/// Templates contain one `{X}` (transport-mode token) and optionally one
/// `{Y}` (place token).
#[derive(Debug, Clone, Copy)]
pub struct DecoyVocabulary {
    pub templates: &'static [&'static str],
    pub modes: &'static [&'static str],
    pub places: &'static [&'static str],
}

/// The vocabulary the quiz ships with.
pub const DEFAULT_VOCABULARY: DecoyVocabulary = DecoyVocabulary {
    templates: &[
        "Mayor announces surprise {X} trial across {Y}",
        "{Y} council to introduce overnight {X} charges",
        "{X} disruption hits commuters after unexpected inspection",
        "Plan to expand {X} in central {Y} leaked",
    ],
    modes: &["ULEZ", "bus", "rail", "parking", "congestion", "roadworks", "ticket"],
    places: &[
        "London",
        "Kent",
        "Surrey",
        "Sussex",
        "Essex",
        "Berkshire",
        "Buckinghamshire",
        "Hampshire",
        "Oxfordshire",
    ],
};

/// Fills every template once with random tokens.
///
/// Pure apart from `rng`: a seeded generator always yields the same
/// headlines.
pub fn fabricate_headlines<R: Rng + ?Sized>(vocab: &DecoyVocabulary, rng: &mut R) -> Vec<String> {
    vocab
        .templates
        .iter()
        .map(|template| {
            let mode = vocab.modes.choose(rng).copied().unwrap_or("bus");
            let place = vocab.places.choose(rng).copied().unwrap_or("London");
            template.replace("{X}", mode).replace("{Y}", place)
        })
        .collect()
}

/// Picks `count` distinct fabricated headlines that differ from `real`.
///
/// Regenerates a bounded number of times if collisions leave too few
/// candidates; returns `None` rather than a short list.
pub fn pick_decoys<R: Rng + ?Sized>(
    vocab: &DecoyVocabulary,
    real: &str,
    count: usize,
    rng: &mut R,
) -> Option<Vec<String>> {
    const MAX_ATTEMPTS: usize = 8;

    let mut pool: Vec<String> = Vec::new();
    for _ in 0..MAX_ATTEMPTS {
        for headline in fabricate_headlines(vocab, rng) {
            if headline != real && !pool.contains(&headline) {
                pool.push(headline);
            }
        }
        if pool.len() >= count {
            pool.shuffle(rng);
            pool.truncate(count);
            return Some(pool);
        }
    }
    None
}
