//! Full-screen terminal renderer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};

use super::input::{handle_question_key, handle_results_key, DismissAction, QuestionAction};
use super::render::{max_review_scroll, render_question, render_results};
use super::state::QuizScreen;
use super::QuizRenderer;
use crate::quiz::{AnswerOutcome, Question, ReviewEntry, Score};

enum Input {
    Key(KeyEvent),
    Resize,
    /// The event stream ended (stdin closed)
    Closed,
}

/// Renders the quiz in the alternate screen and reads answers from the keyboard.
///
/// The terminal is restored when the renderer is dropped, and by a panic
/// hook installed on construction.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    events: EventStream,
    screen: QuizScreen,
}

impl TerminalRenderer {
    pub fn new() -> Result<Self> {
        // Install panic hook BEFORE setting up terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let terminal = setup_terminal().context("Failed to initialise terminal")?;
        Ok(Self {
            terminal,
            events: EventStream::new(),
            screen: QuizScreen::default(),
        })
    }

    async fn next_input(&mut self) -> Result<Input> {
        loop {
            match self.events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    return Ok(Input::Key(key))
                }
                Some(Ok(Event::Resize(_, _))) => return Ok(Input::Resize),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => return Ok(Input::Closed),
            }
        }
    }

    fn draw_question(&mut self, question: &Question) -> Result<()> {
        let screen = &self.screen;
        self.terminal
            .draw(|f| render_question(f, screen, question))?;
        Ok(())
    }
}

#[async_trait]
impl QuizRenderer for TerminalRenderer {
    async fn status(&mut self, line: &str) -> Result<()> {
        self.screen.status = line.to_string();
        Ok(())
    }

    async fn ask(
        &mut self,
        index: usize,
        total: usize,
        question: &Question,
    ) -> Result<Option<String>> {
        self.screen.begin_question(index, total);
        loop {
            self.draw_question(question)?;
            match self.next_input().await? {
                Input::Key(key) => match handle_question_key(&mut self.screen, key.code, key.modifiers) {
                    QuestionAction::Continue => {}
                    QuestionAction::Choose(position) => {
                        return Ok(question.options().get(position).cloned())
                    }
                    QuestionAction::Quit => return Ok(None),
                },
                Input::Resize => {}
                Input::Closed => return Ok(None),
            }
        }
    }

    async fn feedback(
        &mut self,
        _index: usize,
        question: &Question,
        given: &str,
        outcome: AnswerOutcome,
    ) -> Result<()> {
        self.screen.show_feedback(given, outcome);
        loop {
            self.draw_question(question)?;
            match self.next_input().await? {
                Input::Key(_) | Input::Closed => return Ok(()),
                Input::Resize => {}
            }
        }
    }

    async fn results(&mut self, score: Score, review: &[ReviewEntry]) -> Result<()> {
        // Past the last question: the status bar switches to review hints
        self.screen.index = self.screen.total;
        self.screen.answered = None;
        self.screen.scroll = 0;

        loop {
            let screen = &self.screen;
            let height = self.terminal.size()?.height;
            self.terminal
                .draw(|f| render_results(f, screen, score, review))?;

            match self.next_input().await? {
                Input::Key(key) => {
                    let max_scroll = max_review_scroll(review, height);
                    if handle_results_key(&mut self.screen, max_scroll, key.code, key.modifiers)
                        == DismissAction::Dismiss
                    {
                        return Ok(());
                    }
                }
                Input::Resize => {}
                Input::Closed => return Ok(()),
            }
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal(&mut self.terminal) {
            tracing::warn!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
