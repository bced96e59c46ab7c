use serde::{Deserialize, Serialize};

/// Maximum number of questions in one quiz.
pub const MAX_QUESTIONS: usize = 20;

/// Number of options every question offers.
pub const OPTION_COUNT: usize = 4;

/// How a multiple-choice question was derived from its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McqStyle {
    FillInBlank,
    SourceAttribution,
    Recency,
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "style")]
pub enum QuestionKind {
    MultipleChoice(McqStyle),
    RealVsFake,
}

/// Links a question back to the article it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One quiz question.
///
/// Built only through [`Question::new`], which guarantees four distinct
/// options containing the correct answer exactly once. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    kind: QuestionKind,
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_answer: String,
    meta: QuestionMeta,
}

impl Question {
    /// Validates and assembles a question from already-shuffled options.
    ///
    /// Returns `None` if there are not exactly four options, any option
    /// repeats, any option is blank, or the correct answer is missing.
    pub fn new(
        kind: QuestionKind,
        prompt: String,
        options: Vec<String>,
        correct_answer: String,
        meta: QuestionMeta,
    ) -> Option<Self> {
        let options: [String; OPTION_COUNT] = options.try_into().ok()?;
        if options.iter().any(|o| o.trim().is_empty()) {
            return None;
        }
        for (i, a) in options.iter().enumerate() {
            if options[i + 1..].contains(a) {
                return None;
            }
        }
        if !options.contains(&correct_answer) {
            return None;
        }
        Some(Self {
            kind,
            prompt,
            options,
            correct_answer,
            meta,
        })
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in display order.
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn meta(&self) -> &QuestionMeta {
        &self.meta
    }

    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// A bounded, ordered list of questions built for one session.
pub type QuizSet = Vec<Question>;
