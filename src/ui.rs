use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState, PracticeSource};
use crate::clock::Clock;
use crate::metrics::PASS_ACCURACY;
use crate::session::SessionSummary;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

const HIGHLIGHT: Color = Color::Rgb(0x21, 0x96, 0xF3);

impl<C: Clock + Clone> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // notice
                Constraint::Min(5),    // practice text
                Constraint::Length(1), // key hint
                Constraint::Length(1), // stats
                Constraint::Length(self.registry().all().len() as u16 + 2), // levels
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(title(self), bold_style)).render(chunks[0], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .render(chunks[1], buf);
        }

        let text_title = format!(
            "Practice Text (lines {}-{} of {})",
            self.window.start_line() + 1,
            self.window.end_line(),
            self.window.line_count()
        );
        Paragraph::new(chunk_lines(
            self.window.current_chunk_text(),
            self.cursor_in_chunk(),
        ))
        .block(Block::default().borders(Borders::ALL).title(text_title))
        .render(chunks[2], buf);

        let hint = match (self.current_char, self.next_char) {
            (Some(current), Some(next)) => {
                format!("Press: {}   then: {}", key_label(current), key_label(next))
            }
            (Some(current), None) => format!("Press: {}", key_label(current)),
            _ => String::new(),
        };
        Paragraph::new(Span::styled(hint, Style::default().fg(HIGHLIGHT)))
            .render(chunks[3], buf);

        let stats = format!(
            "WPM: {:.1} | Accuracy: {:.1}% | Progress: {}/{}",
            self.stats.wpm,
            self.stats.accuracy,
            self.stats.progress,
            self.session.len()
        );
        Paragraph::new(Span::styled(stats, bold_style)).render(chunks[4], buf);

        Paragraph::new(level_lines(self))
            .block(Block::default().borders(Borders::ALL).title("Levels"))
            .render(chunks[5], buf);

        Paragraph::new(Span::styled(
            "(←) reset / (↑↓) level / (esc) quit",
            italic_style,
        ))
        .render(chunks[6], buf);

        if let AppState::Results(summary) = &self.state {
            render_results(summary, self.session.target_wpm(), area, buf);
        }
    }
}

fn title<C: Clock + Clone>(app: &App<C>) -> String {
    match app.content.level_id {
        Some(id) => format!(
            "Level {}: {} ({} WPM)",
            id, app.content.title, app.content.target_wpm
        ),
        None => format!("{} ({} WPM)", app.content.title, app.content.target_wpm),
    }
}

/// Builds the styled lines of a chunk: typed text in blue, the cursor inverted.
///
/// `cursor` may lie outside the chunk; everything before it counts as typed.
pub fn chunk_lines(chunk: &str, cursor: isize) -> Vec<Line<'static>> {
    let typed_style = Style::default().fg(Color::White).bg(HIGHLIGHT);
    let cursor_style = Style::default()
        .fg(HIGHLIGHT)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);
    let pending_style = Style::default();

    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = pending_style;

    for (i, c) in chunk.chars().enumerate() {
        let i = i as isize;
        let style = if i < cursor {
            typed_style
        } else if i == cursor {
            cursor_style
        } else {
            pending_style
        };

        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;

        match c {
            '\n' => {
                if i == cursor {
                    run.push('⏎');
                }
                if !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
            '\t' => run.push('→'),
            c => run.push(c),
        }
    }

    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    lines.push(Line::from(spans));
    lines
}

pub fn key_label(c: char) -> String {
    match c {
        ' ' => "Space".to_string(),
        '\n' => "Enter".to_string(),
        '\t' => "Tab".to_string(),
        c => c.to_string(),
    }
}

fn level_lines<C: Clock + Clone>(app: &App<C>) -> Vec<Line<'static>> {
    let current = match app.source {
        PracticeSource::Level(id) => Some(id),
        PracticeSource::File { .. } => None,
    };

    app.registry()
        .all()
        .iter()
        .map(|level| {
            let progress = app.level_progress(level.id);
            let mark = if progress.completed { "✓ " } else { "  " };
            let best = if progress.attempts > 0 {
                format!(
                    "  best {:.1} wpm / {:.1}%",
                    progress.best_wpm, progress.best_accuracy
                )
            } else {
                String::new()
            };
            let text = format!(
                "{}Level {}: {} ({} WPM){}",
                mark, level.id, level.name, level.target_wpm, best
            );

            let style = if current == Some(level.id) {
                Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Line::from(Span::styled(text, style))
        })
        .collect()
}

/// Message shown once the last character is typed
pub fn results_message(summary: &SessionSummary, target_wpm: f64) -> Vec<String> {
    if summary.passed {
        vec![
            "Congratulations! You passed!".to_string(),
            String::new(),
            format!("WPM: {:.1}", summary.wpm),
            format!("Accuracy: {:.1}%", summary.accuracy),
        ]
    } else {
        vec![
            "Good effort! Keep practicing.".to_string(),
            String::new(),
            format!("WPM: {:.1} (Target: {})", summary.wpm, target_wpm),
            format!(
                "Accuracy: {:.1}% (Target: {}%)",
                summary.accuracy, PASS_ACCURACY
            ),
        ]
    }
}

fn render_results(summary: &SessionSummary, target_wpm: f64, area: Rect, buf: &mut Buffer) {
    let mut message = results_message(summary, target_wpm);
    message.push(String::new());
    message.push("(←) retry / (↑↓) level / (esc) quit".to_string());

    let width = message.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
    let height = message.len() as u16 + 2;
    let popup = centered_rect(width, height, area);

    let color = if summary.passed {
        Color::Green
    } else {
        Color::Yellow
    };
    let lines: Vec<Line> = message.into_iter().map(Line::from).collect();

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Level Complete")
                .border_style(Style::default().fg(color)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(popup, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
