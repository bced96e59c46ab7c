use crate::quiz::{AnswerOutcome, OPTION_COUNT};

/// Answer shown on the feedback screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Answered {
    pub given: String,
    pub outcome: AnswerOutcome,
}

/// Mutable state behind the question, feedback and results screens.
#[derive(Debug, Default)]
pub(super) struct QuizScreen {
    pub status: String,
    pub index: usize,
    pub total: usize,
    /// Highlighted option (0-based)
    pub selected: usize,
    /// Set between recording an answer and moving on
    pub answered: Option<Answered>,
    pub correct_so_far: usize,
    /// First visible review line on the results screen
    pub scroll: usize,
}

impl QuizScreen {
    /// Resets per-question state for question `index`.
    pub fn begin_question(&mut self, index: usize, total: usize) {
        self.index = index;
        self.total = total;
        self.selected = 0;
        self.answered = None;
    }

    pub fn show_feedback(&mut self, given: &str, outcome: AnswerOutcome) {
        if outcome == AnswerOutcome::Correct {
            self.correct_so_far += 1;
        }
        self.answered = Some(Answered {
            given: given.to_string(),
            outcome,
        });
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % OPTION_COUNT;
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + OPTION_COUNT - 1) % OPTION_COUNT;
    }

    pub fn scroll_down(&mut self, max: usize) {
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        let mut screen = QuizScreen::default();
        screen.select_prev();
        assert_eq!(screen.selected, 3);
        screen.select_next();
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn test_begin_question_clears_feedback() {
        let mut screen = QuizScreen::default();
        screen.selected = 2;
        screen.show_feedback("Kent", AnswerOutcome::Correct);
        assert_eq!(screen.correct_so_far, 1);

        screen.begin_question(1, 20);
        assert_eq!(screen.selected, 0);
        assert!(screen.answered.is_none());
        assert_eq!(screen.correct_so_far, 1);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut screen = QuizScreen::default();
        screen.scroll_up();
        assert_eq!(screen.scroll, 0);
        screen.scroll_down(1);
        screen.scroll_down(1);
        assert_eq!(screen.scroll, 1);
    }
}
