//! Quiz presentation.
//!
//! [`QuizRenderer`] is the seam between the quiz session and whatever shows
//! it; [`run_quiz`] drives any renderer through a session. The shipped
//! implementation is [`TerminalRenderer`], a ratatui full-screen view.
//!
//! # Module Structure
//!
//! - `terminal` - Terminal setup/restore and the event-driven renderer
//! - `input` - Keyboard handling for question and results screens
//! - `render` - Question, feedback and results drawing
//! - `status` - Status bar widget
//! - `state` - Per-screen UI state

mod input;
mod render;
mod state;
mod status;
mod terminal;

use anyhow::Result;
use async_trait::async_trait;

use crate::quiz::{AnswerOutcome, Question, QuizSession, ReviewEntry, Score};

pub use terminal::TerminalRenderer;

/// Displays questions and reports the user's selections.
#[async_trait]
pub trait QuizRenderer: Send {
    /// Shows the summary status line.
    async fn status(&mut self, line: &str) -> Result<()>;

    /// Presents question `index` of `total` and waits for a choice.
    ///
    /// Returns the chosen option text, or `None` when the user stops the
    /// quiz early.
    async fn ask(&mut self, index: usize, total: usize, question: &Question)
        -> Result<Option<String>>;

    /// Shows the outcome of a recorded answer.
    async fn feedback(
        &mut self,
        index: usize,
        question: &Question,
        given: &str,
        outcome: AnswerOutcome,
    ) -> Result<()>;

    /// Shows the final score and per-question review.
    async fn results(&mut self, score: Score, review: &[ReviewEntry]) -> Result<()>;
}

/// Walks the session's unanswered questions in order, then shows results.
///
/// Selections the session rejects (options not offered) are asked again.
/// Stopping early still ends with the results screen; unanswered questions
/// count as wrong.
pub async fn run_quiz<R: QuizRenderer + ?Sized>(
    session: &mut QuizSession,
    renderer: &mut R,
) -> Result<Score> {
    let total = session.len();

    'questions: for index in 0..total {
        if session.answer(index).is_some() {
            continue;
        }
        loop {
            let Some(question) = session.questions().get(index).cloned() else {
                break 'questions;
            };
            let Some(choice) = renderer.ask(index, total, &question).await? else {
                tracing::debug!(index, "Quiz stopped early");
                break 'questions;
            };

            let outcome = session.record_answer(index, &choice);
            if outcome.was_recorded() {
                renderer.feedback(index, &question, &choice, outcome).await?;
                break;
            }
            tracing::debug!(index, ?outcome, "Selection rejected");
        }
    }

    let score = session.score();
    renderer.results(score, &session.review()).await?;
    Ok(score)
}
