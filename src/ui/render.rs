//! Drawing for the question, feedback and results screens.
//!
//! All feed-derived text passes through `strip_control_chars` before it
//! reaches a widget.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::state::QuizScreen;
use super::status;
use crate::quiz::{AnswerOutcome, Question, QuestionKind, ReviewEntry, Score};
use crate::util::{strip_control_chars, truncate_to_width};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 13;

/// Option rows plus borders.
const OPTIONS_HEIGHT: u16 = 6;

/// Verdict, source and link lines under the options.
const FEEDBACK_HEIGHT: u16 = 3;

/// Renders a "too small" notice and returns false if the frame can't fit the UI.
fn check_size(f: &mut Frame) -> bool {
    let area = f.area();

    // EDGE-001: Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return false;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return false;
    }
    true
}

fn kind_label(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::RealVsFake => "Real or fake",
        QuestionKind::MultipleChoice(_) => "Multiple choice",
    }
}

/// Question screen; doubles as the feedback screen once `screen.answered` is set.
pub(super) fn render_question(f: &mut Frame, screen: &QuizScreen, question: &Question) {
    if !check_size(f) {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(OPTIONS_HEIGHT),
            Constraint::Length(FEEDBACK_HEIGHT),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = format!(
        " Question {}/{} - {} ",
        screen.index + 1,
        screen.total,
        kind_label(question.kind())
    );
    let prompt = Paragraph::new(strip_control_chars(question.prompt()).into_owned())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(prompt, chunks[0]);

    render_options(f, screen, question, chunks[1]);
    render_feedback(f, screen, question, chunks[2]);
    status::render(f, screen, chunks[3]);
}

fn render_options(f: &mut Frame, screen: &QuizScreen, question: &Question, area: Rect) {
    // Room for borders, "N. " prefix and the highlight marker
    let max_width = area.width.saturating_sub(8) as usize;

    let items: Vec<ListItem> = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let clean = strip_control_chars(option);
            let text = truncate_to_width(&clean, max_width);

            let style = match &screen.answered {
                Some(_) if question.is_correct(option) => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                Some(answered) if answered.given == *option => Style::default().fg(Color::Red),
                Some(_) => Style::default().fg(Color::DarkGray),
                None => Style::default(),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Cyan)),
                Span::styled(text.into_owned(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Options "))
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("> ");

    // No highlight while showing feedback so the colours read clearly
    let mut state = ListState::default();
    if screen.answered.is_none() {
        state.select(Some(screen.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// "Link: <url>" styled for the card and the review, cut to `width`.
fn link_line(prefix: &str, link: &str, width: usize) -> Line<'static> {
    let text = format!("{prefix}Link: {}", strip_control_chars(link));
    Line::from(Span::styled(
        truncate_to_width(&text, width).into_owned(),
        Style::default().fg(Color::Blue),
    ))
}

/// Verdict and source once answered; the article link is always shown.
fn render_feedback(f: &mut Frame, screen: &QuizScreen, question: &Question, area: Rect) {
    let width = area.width as usize;
    let mut lines = Vec::new();

    if let Some(answered) = &screen.answered {
        match answered.outcome {
            AnswerOutcome::Correct => lines.push(Line::from(Span::styled(
                "✅ Correct",
                Style::default().fg(Color::Green),
            ))),
            _ => lines.push(Line::from(vec![
                Span::styled("❌ Correct: ", Style::default().fg(Color::Red)),
                Span::raw(strip_control_chars(question.correct_answer()).into_owned()),
            ])),
        }
        if let Some(source) = &question.meta().source_name {
            let text = format!("Source: {}", strip_control_chars(source));
            lines.push(Line::from(Span::styled(
                truncate_to_width(&text, width).into_owned(),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if let Some(link) = &question.meta().link {
        lines.push(link_line("", link, width));
    }

    f.render_widget(Paragraph::new(lines), area);
}

/// Lines per review entry: prompt, answers, and the link when there is one.
fn entry_height(entry: &ReviewEntry) -> usize {
    2 + usize::from(entry.link.is_some())
}

/// Per question: the prompt, the given and correct answers, then the link.
fn review_lines(review: &[ReviewEntry], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(review.iter().map(entry_height).sum());
    for (i, entry) in review.iter().enumerate() {
        // Prompts may span lines (fill-in-the-blank); flatten for the list
        let prompt = strip_control_chars(&entry.prompt).replace('\n', " ");
        let heading = format!("{}. {}", i + 1, prompt);
        lines.push(Line::from(Span::styled(
            truncate_to_width(&heading, width).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )));

        let given = entry
            .given
            .as_deref()
            .map(|g| strip_control_chars(g).into_owned())
            .unwrap_or_else(|| "(no answer)".to_string());
        let verdict = if entry.is_correct {
            Span::styled("✅ Correct", Style::default().fg(Color::Green))
        } else {
            Span::styled(
                format!(
                    "❌ Correct: {}",
                    strip_control_chars(&entry.correct_answer)
                ),
                Style::default().fg(Color::Red),
            )
        };
        lines.push(Line::from(vec![
            Span::raw(format!("   Your answer: {given} - ")),
            verdict,
        ]));
        if let Some(link) = &entry.link {
            lines.push(link_line("   ", link, width));
        }
    }
    lines
}

/// Number of review lines that can be scrolled past for a frame of `height`.
pub(super) fn max_review_scroll(review: &[ReviewEntry], height: u16) -> usize {
    // Score header (3) + status bar (1) + review borders (2)
    let visible = height.saturating_sub(6) as usize;
    review
        .iter()
        .map(entry_height)
        .sum::<usize>()
        .saturating_sub(visible)
}

pub(super) fn render_results(
    f: &mut Frame,
    screen: &QuizScreen,
    score: Score,
    review: &[ReviewEntry],
) {
    if !check_size(f) {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(format!("Your score: {}/{}", score.correct, score.total))
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" Results "));
    f.render_widget(header, chunks[0]);

    let width = chunks[1].width.saturating_sub(2) as usize;
    let lines: Vec<Line> = review_lines(review, width)
        .into_iter()
        .skip(screen.scroll)
        .collect();
    let body = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Review "));
    f.render_widget(body, chunks[1]);

    status::render(f, screen, chunks[2]);
}
