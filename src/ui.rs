use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use reckon::{game::Outcome, NumberPool, NumberState, Phase};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const GRID_COLUMNS: usize = 10;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.phase() {
            Phase::Setup => render_setup(self, area, buf),
            Phase::Playing | Phase::AwaitingRoundAdvance => render_play(self, area, buf),
            Phase::Over => render_over(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn centered_rows(area: Rect, rows: u16) -> Rect {
    let top = area.height.saturating_sub(rows) / 2;
    Rect {
        y: area.y + top,
        height: rows.min(area.height),
        ..area
    }
}

fn render_setup(app: &App, area: Rect, buf: &mut Buffer) {
    let rules = app.session.rules();
    let lines = vec![
        Line::from(Span::styled("reckon", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(format!(
            "{} rounds · {}s on the clock · wrong answers cost {}s",
            app.session.rounds_total(),
            rules.time_budget_secs,
            rules.penalty_secs
        )),
        Line::from("Combine pool numbers with + - * / and parentheses to hit each target."),
        Line::from("Every number can be used once per game."),
        Line::from(""),
        Line::from(Span::styled("(enter) start / (esc)ape", italic())),
    ];
    let rows = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered_rows(area, rows), buf);
}

fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let grid_rows = (session.pool().size() as usize).div_ceil(GRID_COLUMNS) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(1),
            Constraint::Length(1), // target
            Constraint::Length(1),
            Constraint::Length(grid_rows),
            Constraint::Length(1), // pool key
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Length(1), // message
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let round = session.current_round();
    let clock_style = if session.is_clock_running() {
        bold()
    } else {
        bold().add_modifier(Modifier::DIM)
    };
    let status = Line::from(vec![
        Span::styled(
            format!(
                "round {}/{}",
                round.map_or(0, |r| r.index + 1),
                session.rounds_total()
            ),
            bold(),
        ),
        Span::raw("   "),
        Span::styled(format_clock(session.seconds_remaining()), clock_style),
        Span::raw("   "),
        Span::styled(format!("{} correct", session.correct_count()), bold()),
    ]);
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(round) = round {
        Paragraph::new(Span::styled(
            format!("target  {}", round.target),
            bold().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    let grid: Vec<Line> = session
        .pool()
        .iter()
        .chunks(GRID_COLUMNS)
        .into_iter()
        .map(|row| {
            Line::from(
                row.map(|n| Span::styled(format!("{:>4}", n.value), number_style(n.state)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    Paragraph::new(grid)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    Paragraph::new(pool_key(session.pool()))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    let prompt = "> ";
    let room = (chunks[7].width as usize).saturating_sub(prompt.width() + 1);
    let input = Line::from(vec![
        Span::styled(prompt, bold().add_modifier(Modifier::DIM)),
        Span::styled(tail_fit(session.input(), room).to_string(), bold()),
        Span::styled(
            "_",
            Style::default()
                .add_modifier(Modifier::DIM)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);
    Paragraph::new(input)
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

    if let Some(message) = &app.message {
        Paragraph::new(Span::styled(message.as_str(), message_style(app.last_outcome.as_ref())))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
    }

    let legend = match session.phase() {
        Phase::AwaitingRoundAdvance => "(enter) next round / (esc) end game",
        _ => "(enter) submit / (?) remove a number for time / (del) clear / (esc) end game",
    };
    Paragraph::new(Span::styled(legend, italic()))
        .alignment(Alignment::Center)
        .render(chunks[10], buf);
}

fn number_style(state: NumberState) -> Style {
    match state {
        NumberState::Available => bold(),
        NumberState::Used => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::CROSSED_OUT),
        NumberState::Removed => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT),
    }
}

/// `Available 97   Used 3   Removed 0`, each label in its grid style.
fn pool_key(pool: &NumberPool) -> Line<'static> {
    let labels = [NumberState::Available, NumberState::Used, NumberState::Removed]
        .into_iter()
        .map(|state| {
            Span::styled(
                format!("{state} {}", pool.count(state)),
                number_style(state).remove_modifier(Modifier::CROSSED_OUT),
            )
        });
    let spans = Itertools::intersperse(labels, Span::raw("   ")).collect::<Vec<_>>();
    Line::from(spans)
}

fn render_over(app: &App, area: Rect, buf: &mut Buffer) {
    let summary = app.session.summary();
    let mut lines = vec![
        Line::from(Span::styled("game over", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} points", summary.score),
            bold().fg(Color::Yellow),
        )),
        Line::from(format!(
            "{} correct   {}/{} rounds   {} left",
            summary.correct_count,
            summary.rounds_played,
            summary.rounds_total,
            format_clock(summary.seconds_remaining)
        )),
    ];
    if let Some(message) = &app.message {
        lines.push(Line::from(Span::styled(
            message.as_str(),
            message_style(app.last_outcome.as_ref()),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("(r)estart / (esc)ape", italic())));

    let rows = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered_rows(area, rows), buf);
}

fn message_style(outcome: Option<&Outcome>) -> Style {
    match outcome {
        Some(Outcome::Correct) => bold().fg(Color::Green),
        Some(Outcome::Incorrect { .. }) => bold().fg(Color::Red),
        Some(Outcome::Rejected) => Style::default().fg(Color::Yellow),
        Some(Outcome::Removed { .. }) => Style::default().fg(Color::Magenta),
        Some(Outcome::Info) | Some(Outcome::Unchanged) | None => italic(),
    }
}

pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Longest suffix of `text` that fits in `width` columns.
pub fn tail_fit(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut start = text.len();
    for (idx, _) in text.char_indices().rev() {
        if text[idx..].width() > width {
            break;
        }
        start = idx;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(300), "5:00");
    }

    #[test]
    fn test_pool_key_counts_states() {
        let mut pool = NumberPool::new(10);
        pool.mark_used(&[2, 3]);
        let text: String = pool_key(&pool)
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(text, "Available 8   Used 2   Removed 0");
    }

    #[test]
    fn test_tail_fit() {
        assert_eq!(tail_fit("1+2", 10), "1+2");
        assert_eq!(tail_fit("(12+34)*5", 3), ")*5");
        assert_eq!(tail_fit("abc", 0), "");
    }
}
