use std::collections::HashMap;

use serde::Serialize;

use crate::quiz::types::{Question, QuizSet};

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// The question was already answered; the first answer stands.
    AlreadyAnswered,
    UnknownQuestion,
    /// The option is not one of the question's four options.
    InvalidOption,
}

impl AnswerOutcome {
    /// True if this call recorded an answer.
    pub fn was_recorded(&self) -> bool {
        matches!(self, AnswerOutcome::Correct | AnswerOutcome::Incorrect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

/// One line of the end-of-quiz review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub prompt: String,
    pub given: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A quiz plus the answers given so far.
///
/// Each question accepts exactly one answer; later submissions for the same
/// question are rejected without changing state.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    quiz: QuizSet,
    answers: HashMap<usize, String>,
}

impl QuizSession {
    pub fn new(quiz: QuizSet) -> Self {
        Self {
            quiz,
            answers: HashMap::new(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.quiz
    }

    pub fn len(&self) -> usize {
        self.quiz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quiz.is_empty()
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.quiz.len()
    }

    /// Records the first answer for question `index`.
    pub fn record_answer(&mut self, index: usize, option: &str) -> AnswerOutcome {
        let Some(question) = self.quiz.get(index) else {
            return AnswerOutcome::UnknownQuestion;
        };
        if self.answers.contains_key(&index) {
            return AnswerOutcome::AlreadyAnswered;
        }
        if !question.has_option(option) {
            return AnswerOutcome::InvalidOption;
        }

        let correct = question.is_correct(option);
        self.answers.insert(index, option.to_string());
        if correct {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    /// Correct answers so far out of the full quiz length.
    pub fn score(&self) -> Score {
        let correct = self
            .answers
            .iter()
            .filter(|(index, given)| {
                self.quiz
                    .get(**index)
                    .is_some_and(|q| q.is_correct(given))
            })
            .count();
        Score {
            correct,
            total: self.quiz.len(),
        }
    }

    pub fn review(&self) -> Vec<ReviewEntry> {
        self.quiz
            .iter()
            .enumerate()
            .map(|(index, q)| {
                let given = self.answers.get(&index).cloned();
                ReviewEntry {
                    prompt: q.prompt().to_string(),
                    is_correct: given.as_deref().is_some_and(|g| q.is_correct(g)),
                    given,
                    correct_answer: q.correct_answer().to_string(),
                    link: q.meta().link.clone(),
                }
            })
            .collect()
    }
}
