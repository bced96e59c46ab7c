use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

use super::state::QuizScreen;
use crate::util::truncate_to_width;

/// Render the status bar
pub fn render(f: &mut Frame, screen: &QuizScreen, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let hints: &str = if screen.total == 0 || screen.index >= screen.total {
        "[j/k]scroll [q]uit"
    } else if screen.answered.is_some() {
        "any key: next question"
    } else {
        "[1-4]answer [j/k]move [Enter]select [q]uit"
    };

    let text: Cow<'_, str> = if screen.status.is_empty() {
        Cow::Borrowed(hints)
    } else {
        Cow::Owned(format!(
            "{} | Score {}  {}",
            screen.status, screen.correct_so_far, hints
        ))
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let paragraph = Paragraph::new(truncate_to_width(&text, area.width as usize).into_owned())
        .style(style);
    f.render_widget(paragraph, area);
}
