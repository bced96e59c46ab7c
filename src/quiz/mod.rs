//! Quiz generation and scoring.
//!
//! - [`generator`] turns a filtered item pool into a [`QuizSet`]
//! - [`decoys`] fabricates plausible fake headlines
//! - [`recency`] buckets publication dates into answer labels
//! - [`session`] records answers and computes the score

pub mod decoys;
pub mod generator;
pub mod recency;
pub mod session;
mod types;

pub use generator::{build_multiple_choice, generate_quiz};
pub use session::{AnswerOutcome, QuizSession, ReviewEntry, Score};
pub use types::{McqStyle, Question, QuestionKind, QuestionMeta, QuizSet, MAX_QUESTIONS, OPTION_COUNT};
