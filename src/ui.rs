use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};
use keyrace::race::RaceResult;

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Countdown => render_countdown(self, area, buf),
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let secs = app.countdown_remaining_secs();
    let mut lines = vec![Line::styled(
        format!("race begins in {:.0}", secs.ceil().max(1.0)),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(wpm) = app.opponent_wpm() {
        lines.push(Line::styled(
            format!("opponent pace: {:.0} wpm", wpm),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let message = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    message.render(centered_band(area, 2), buf);
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let reference = app.reference();
    let typed: Vec<char> = app.typed.chars().collect();
    let cursor = typed.len().min(reference.chars().count());

    let mut spans: Vec<Span> = reference
        .chars()
        .enumerate()
        .map(|(i, expected)| match typed.get(i) {
            Some(&t) if t == expected => Span::styled(expected.to_string(), green_bold_style),
            Some(_) => Span::styled(expected.to_string(), red_bold_style),
            None if i == cursor => {
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            }
            None => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect();
    if spans.is_empty() {
        spans.push(Span::styled("...", dim_bold_style));
    }

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines =
        ((reference.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

    let snap = app.live_snapshot();
    let mut status = format!(
        "{:>5.1} wpm   {:>5.1}% acc   {:>4.1}s",
        snap.wpm,
        snap.accuracy,
        snap.elapsed_millis as f64 / 1000.0
    );
    if let Some((you, opponent)) = app.race_progress() {
        status.push_str(&format!(
            "   you {:>3.0}%  bot {:>3.0}%",
            you * 100.0,
            opponent * 100.0
        ));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    (area.height.saturating_sub(prompt_occupied_lines + 2)) / 2,
                ),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(2),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        status,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let magenta_style = Style::default().fg(Color::Magenta);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines: Vec<Line> = Vec::new();

    if let Some(outcome) = app.final_outcome {
        let (label, color) = match outcome {
            RaceResult::Win => ("you win", Color::Green),
            RaceResult::Loss => ("you lose", Color::Red),
            RaceResult::Draw => ("draw", Color::Yellow),
            _ => ("race over", Color::Gray),
        };
        lines.push(Line::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::default());
    }

    if let Some(snap) = app.final_snapshot {
        lines.push(Line::styled(
            format!("{:.1} wpm", snap.wpm),
            magenta_style.add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::styled(
            format!(
                "{:.1}% accuracy   {} errors   {:.1}s",
                snap.accuracy,
                snap.errors,
                snap.elapsed_millis as f64 / 1000.0
            ),
            magenta_style,
        ));
    }

    lines.push(Line::default());
    lines.push(Line::styled("(r)etry / (esc)ape", italic_style));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered_band(area, 6), buf);
}

/// A horizontal band of `height` rows vertically centered in `area`.
fn centered_band(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: height.min(area.height),
    }
}
