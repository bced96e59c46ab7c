use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::feed::NewsItem;
use crate::quiz::decoys::{pick_decoys, DEFAULT_VOCABULARY};
use crate::quiz::recency::{recency_bucket, RECENCY_LABELS};
use crate::quiz::types::{
    McqStyle, Question, QuestionKind, QuestionMeta, QuizSet, MAX_QUESTIONS, OPTION_COUNT,
};
use crate::util::clean_word;

/// Only the most recent items are used to build questions.
pub const POOL_LIMIT: usize = 80;

/// Number of items drawn for the real-vs-fake round.
pub const REAL_VS_FAKE_ROUND: usize = 5;

/// Number of items drawn as mixed-round candidates.
pub const MIXED_CANDIDATES: usize = 40;

/// Titles sampled for fill-in-the-blank distractor words.
const FILL_BLANK_SAMPLE: usize = 12;

const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// Gazetteer for place-association questions, checked in order.
pub const PLACES: &[&str] = &[
    "London",
    "Westminster",
    "Camden",
    "Islington",
    "Hackney",
    "Kent",
    "Surrey",
    "Sussex",
    "Essex",
    "Berkshire",
    "Hampshire",
    "Oxford",
];

/// Answer used when no gazetteer entry appears in the item.
const DEFAULT_PLACE: &str = "London";

/// Fall-through order of the mixed-round question styles.
const STYLE_ORDER: [McqStyle; 4] = [
    McqStyle::FillInBlank,
    McqStyle::SourceAttribution,
    McqStyle::Recency,
    McqStyle::Place,
];

/// Builds up to [`MAX_QUESTIONS`] questions from a filtered item pool.
///
/// A real-vs-fake round over [`REAL_VS_FAKE_ROUND`] random items comes
/// first, then a mixed round over up to [`MIXED_CANDIDATES`] random items.
/// Items that cannot support a style are skipped or fall through to the
/// next style; nothing is retried. An empty pool yields an empty quiz.
///
/// `now` anchors recency questions; `rng` drives every random choice, so a
/// seeded generator reproduces the same quiz.
pub fn generate_quiz<R: Rng + ?Sized>(
    items: &[NewsItem],
    now: DateTime<Utc>,
    rng: &mut R,
) -> QuizSet {
    let pool = &items[..items.len().min(POOL_LIMIT)];
    let sources = distinct_sources(pool);
    let mut quiz: QuizSet = Vec::new();

    let titled: Vec<&NewsItem> = pool.iter().filter(|it| !it.title.is_empty()).collect();
    for item in pick_n(&titled, REAL_VS_FAKE_ROUND, rng) {
        if let Some(q) = real_vs_fake_question(item, rng) {
            push_unique(&mut quiz, q);
        }
    }

    for item in pick_n(&titled, MIXED_CANDIDATES, rng) {
        if quiz.len() >= MAX_QUESTIONS {
            break;
        }

        let start = first_style_index(rng.random::<f64>());
        let question = STYLE_ORDER[start..].iter().find_map(|style| match style {
            McqStyle::FillInBlank => try_fill_in_blank(item, pool, rng),
            McqStyle::SourceAttribution => source_question(item, &sources, rng),
            McqStyle::Recency => recency_question(item, now, rng),
            McqStyle::Place => place_question(item, rng),
        });

        match question {
            Some(q) => push_unique(&mut quiz, q),
            None => tracing::trace!(title = %item.title, "No eligible question style for item"),
        }
    }

    quiz.truncate(MAX_QUESTIONS);
    quiz
}

/// Maps a uniform draw in `[0, 1)` to the first style to attempt:
/// ~33% fill-in-the-blank, ~33% source, ~17% recency, ~17% place.
fn first_style_index(draw: f64) -> usize {
    if draw < 0.33 {
        0
    } else if draw < 0.66 {
        1
    } else if draw < 0.83 {
        2
    } else {
        3
    }
}

/// Skips a question identical (same prompt and answer) to one already taken.
fn push_unique(quiz: &mut QuizSet, question: Question) {
    let duplicate = quiz
        .iter()
        .any(|q| q.prompt() == question.prompt() && q.correct_answer() == question.correct_answer());
    if !duplicate {
        quiz.push(question);
    }
}

/// Random sample of up to `n` elements, in random order.
fn pick_n<'a, T, R: Rng + ?Sized>(items: &'a [T], n: usize, rng: &mut R) -> Vec<&'a T> {
    let mut picked: Vec<&T> = items.iter().collect();
    picked.shuffle(rng);
    picked.truncate(n);
    picked
}

/// Source names in first-seen order, without repeats.
fn distinct_sources(pool: &[NewsItem]) -> Vec<&str> {
    let mut sources: Vec<&str> = Vec::new();
    for item in pool {
        if !sources.contains(&item.source.as_str()) {
            sources.push(&item.source);
        }
    }
    sources
}

fn item_meta(item: &NewsItem) -> QuestionMeta {
    QuestionMeta {
        source_name: Some(item.source.clone()).filter(|s| !s.is_empty()),
        link: Some(item.link.clone()).filter(|l| !l.is_empty()),
    }
}

/// Assembles a multiple-choice question from a correct answer and a
/// distractor pool.
///
/// Blank distractors and copies of the answer are discarded and the rest
/// deduplicated; three are drawn without replacement and shuffled in with
/// the answer. Returns `None` when fewer than three remain.
pub fn build_multiple_choice<R: Rng + ?Sized>(
    kind: QuestionKind,
    prompt: String,
    correct: &str,
    distractors: &[String],
    meta: QuestionMeta,
    rng: &mut R,
) -> Option<Question> {
    let mut eligible: Vec<&String> = Vec::new();
    for d in distractors {
        if !d.trim().is_empty() && d != correct && !eligible.contains(&d) {
            eligible.push(d);
        }
    }
    if eligible.len() < DISTRACTOR_COUNT {
        return None;
    }

    eligible.shuffle(rng);
    let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    options.push(correct.to_string());
    options.extend(eligible.into_iter().take(DISTRACTOR_COUNT).cloned());
    options.shuffle(rng);

    Question::new(kind, prompt, options, correct.to_string(), meta)
}

/// "Which of these is a real headline?" with three fabricated decoys.
pub fn real_vs_fake_question<R: Rng + ?Sized>(item: &NewsItem, rng: &mut R) -> Option<Question> {
    if item.title.is_empty() {
        return None;
    }
    let decoys = pick_decoys(&DEFAULT_VOCABULARY, &item.title, DISTRACTOR_COUNT, rng)?;
    let mut options = decoys;
    options.push(item.title.clone());
    options.shuffle(rng);

    Question::new(
        QuestionKind::RealVsFake,
        "Which of these is a real headline?".to_string(),
        options,
        item.title.clone(),
        item_meta(item),
    )
}

/// Replaces the word at `index` with a blank.
///
/// Requires more than four words and an interior index (never the first or
/// last word). Returns the blanked headline and the cleaned answer, or
/// `None` if the word has no word characters.
pub fn blank_word(title: &str, index: usize) -> Option<(String, String)> {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() <= 4 || index == 0 || index >= words.len() - 1 {
        return None;
    }
    let answer = clean_word(words[index]);
    if answer.is_empty() {
        return None;
    }
    let blanked = words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == index { "____" } else { w })
        .collect::<Vec<_>>()
        .join(" ");
    Some((blanked, answer))
}

/// Fill-in-the-blank question for a fixed word index and distractor pool.
pub fn fill_in_blank_question<R: Rng + ?Sized>(
    item: &NewsItem,
    index: usize,
    distractor_words: &[String],
    rng: &mut R,
) -> Option<Question> {
    let (blanked, answer) = blank_word(&item.title, index)?;
    build_multiple_choice(
        QuestionKind::MultipleChoice(McqStyle::FillInBlank),
        format!("Fill the missing word in this real headline:\n“{blanked}”"),
        &answer,
        distractor_words,
        item_meta(item),
        rng,
    )
}

/// Picks a random interior word and draws distractors from the second word
/// of [`FILL_BLANK_SAMPLE`] random pool titles.
fn try_fill_in_blank<R: Rng + ?Sized>(
    item: &NewsItem,
    pool: &[NewsItem],
    rng: &mut R,
) -> Option<Question> {
    let word_count = item.title.split_whitespace().count();
    if word_count <= 4 {
        return None;
    }
    let index = rng.random_range(0..word_count).clamp(1, word_count - 2);

    let distractor_words: Vec<String> = pick_n(pool, FILL_BLANK_SAMPLE, rng)
        .into_iter()
        .filter_map(|other| other.title.split_whitespace().nth(1))
        .map(clean_word)
        .collect();

    fill_in_blank_question(item, index, &distractor_words, rng)
}

/// "Which outlet published ...?" using the other sources seen in the pool.
fn source_question<R: Rng + ?Sized>(
    item: &NewsItem,
    sources: &[&str],
    rng: &mut R,
) -> Option<Question> {
    let alternatives: Vec<String> = sources
        .iter()
        .filter(|s| **s != item.source)
        .map(|s| s.to_string())
        .collect();

    build_multiple_choice(
        QuestionKind::MultipleChoice(McqStyle::SourceAttribution),
        format!("Which outlet published: “{}”?", item.title),
        &item.source,
        &alternatives,
        QuestionMeta {
            source_name: None,
            link: Some(item.link.clone()).filter(|l| !l.is_empty()),
        },
        rng,
    )
}

/// "Roughly when was this published?"; needs a parseable date.
fn recency_question<R: Rng + ?Sized>(
    item: &NewsItem,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<Question> {
    // Missing or unreadable dates skip this style rather than guessing "Today"
    let published = item.published()?;
    let correct = recency_bucket(published, now);
    let others: Vec<String> = RECENCY_LABELS
        .iter()
        .filter(|l| **l != correct)
        .map(|l| l.to_string())
        .collect();

    build_multiple_choice(
        QuestionKind::MultipleChoice(McqStyle::Recency),
        format!("Roughly when was this published? “{}”", item.title),
        correct,
        &others,
        item_meta(item),
        rng,
    )
}

/// First gazetteer entry mentioned by the item, defaulting to London.
pub fn associated_place(item: &NewsItem) -> &'static str {
    let text = item.headline_text().to_lowercase();
    PLACES
        .iter()
        .copied()
        .find(|p| text.contains(&p.to_lowercase()))
        .unwrap_or(DEFAULT_PLACE)
}

/// "Where is this most closely associated?"; the fallback style.
fn place_question<R: Rng + ?Sized>(item: &NewsItem, rng: &mut R) -> Option<Question> {
    let correct = associated_place(item);
    let others: Vec<String> = PLACES
        .iter()
        .filter(|p| **p != correct)
        .map(|p| p.to_string())
        .collect();

    build_multiple_choice(
        QuestionKind::MultipleChoice(McqStyle::Place),
        format!("Where is this most closely associated? “{}”", item.title),
        correct,
        &others,
        item_meta(item),
        rng,
    )
}
