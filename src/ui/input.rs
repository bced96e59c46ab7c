//! Keyboard handling.
//!
//! Handlers mutate [`QuizScreen`] and return what the renderer should do
//! next; they never touch the terminal.

use crossterm::event::{KeyCode, KeyModifiers};

use super::state::QuizScreen;
use crate::quiz::OPTION_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum QuestionAction {
    Continue,
    /// Submit the option at this 0-based position
    Choose(usize),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DismissAction {
    Continue,
    Dismiss,
}

fn is_interrupt(code: KeyCode, modifiers: KeyModifiers) -> bool {
    code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL)
}

/// j/k or arrows move, 1-4 answer directly, Enter answers the highlighted
/// option, q/Esc/Ctrl+C stop the quiz.
pub(super) fn handle_question_key(
    screen: &mut QuizScreen,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> QuestionAction {
    if is_interrupt(code, modifiers) {
        return QuestionAction::Quit;
    }

    match code {
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
            screen.select_next();
            QuestionAction::Continue
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
            screen.select_prev();
            QuestionAction::Continue
        }
        KeyCode::Enter | KeyCode::Char(' ') => QuestionAction::Choose(screen.selected),
        KeyCode::Char(c @ '1'..='9') => {
            let position = c as usize - '1' as usize;
            if position < OPTION_COUNT {
                screen.selected = position;
                QuestionAction::Choose(position)
            } else {
                QuestionAction::Continue
            }
        }
        KeyCode::Char('q') | KeyCode::Esc => QuestionAction::Quit,
        _ => QuestionAction::Continue,
    }
}

/// j/k or arrows scroll the review; q/Esc/Enter/Ctrl+C close it.
pub(super) fn handle_results_key(
    screen: &mut QuizScreen,
    max_scroll: usize,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> DismissAction {
    if is_interrupt(code, modifiers) {
        return DismissAction::Dismiss;
    }

    match code {
        KeyCode::Down | KeyCode::Char('j') => {
            screen.scroll_down(max_scroll);
            DismissAction::Continue
        }
        KeyCode::Up | KeyCode::Char('k') => {
            screen.scroll_up();
            DismissAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => DismissAction::Dismiss,
        _ => DismissAction::Continue,
    }
}
