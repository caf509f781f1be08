//! TUI rendering with ratatui
//!
//! Draws the conversion screen: selection cards, status, log panel,
//! status bar, and the modal layers on top.

use std::path::Path;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Padding, Paragraph, Wrap},
    Frame,
};

use super::app::App;
use super::prompt::PromptKind;
use crate::core::{ConversionStatus, LogEntry, LogLevel, NotificationKind};

/// Shown in the log panel until the first entry arrives
pub const EMPTY_LOG_PLACEHOLDER: &str = "[AWAITING SIGNAL...]";

/// Frames of one back-and-forth sweep of the activity bar
const SWEEP_FRAMES: usize = 24;

/// Main draw function - renders the entire TUI
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let processing = app.snapshot.is_converting;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                // Header
            Constraint::Length(4),                                // Selection cards
            Constraint::Length(if processing { 3 } else { 0 }),   // Activity bar
            Constraint::Min(5),                                   // Logs
            Constraint::Length(3),                                // Status bar
        ])
        .split(area);

    draw_header(frame, chunks[0], app);
    draw_cards(frame, chunks[1], app);
    if processing {
        draw_activity(frame, chunks[2], app);
    }
    draw_logs(frame, chunks[3], app);
    draw_status_bar(frame, chunks[4], app);

    // Modals, drawn last
    if let Some(notification) = &app.snapshot.notification {
        draw_notification(frame, area, app, notification.kind, &notification.message);
    }
    if app.prompt.is_some() {
        draw_prompt(frame, area, app);
    }
    if app.show_help {
        draw_help_overlay(frame, area);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let status = &app.snapshot.status;
    let line = Line::from(vec![
        Span::styled(
            " PARCEL DECK ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            status.label(),
            Style::default()
                .fg(status_color(status))
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

fn draw_cards(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ])
        .split(area);

    let selection = &app.snapshot.selection;

    draw_path_card(
        frame,
        chunks[0],
        " [o] Output Folder ",
        selection.output_folder(),
        true,
    );
    draw_path_card(
        frame,
        chunks[1],
        " [i] Input File ",
        selection.input_file(),
        app.snapshot.can_select_file(),
    );

    let (label, style) = if app.snapshot.can_convert() {
        (
            "READY",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else if app.snapshot.is_converting {
        ("RUNNING", Style::default().fg(Color::Yellow))
    } else {
        ("LOCKED", Style::default().fg(Color::DarkGray))
    };

    let convert = Paragraph::new(Line::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" [Enter] Convert ")
                .border_style(style),
        );
    frame.render_widget(convert, chunks[2]);
}

fn draw_path_card(frame: &mut Frame, area: Rect, title: &str, path: Option<&Path>, enabled: bool) {
    let border = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let body = match path {
        Some(path) => Span::styled(shorten_path(path), Style::default().fg(Color::White)),
        None if enabled => Span::styled("Not selected", Style::default().fg(Color::DarkGray)),
        None => Span::styled("Choose a folder first", Style::default().fg(Color::DarkGray)),
    };

    let card = Paragraph::new(Line::from(body)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(card, area);
}

/// Indeterminate progress: a bar sweeping back and forth
fn draw_activity(frame: &mut Frame, area: Rect, app: &App) {
    let step = app.tick % (SWEEP_FRAMES * 2);
    let step = if step > SWEEP_FRAMES {
        SWEEP_FRAMES * 2 - step
    } else {
        step
    };
    let ratio = step as f64 / SWEEP_FRAMES as f64;

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Converting "))
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(ConversionStatus::Processing.label());

    frame.render_widget(gauge, area);
}

fn draw_logs(frame: &mut Frame, area: Rect, app: &App) {
    let height = area.height.saturating_sub(2) as usize;
    let total = app.logs.len();

    let lines: Vec<Line> = if total == 0 {
        vec![Line::from(Span::styled(
            EMPTY_LOG_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let end = total.saturating_sub(app.log_scroll);
        let start = end.saturating_sub(height);
        app.logs[start..end]
            .iter()
            .map(|entry| log_line(entry, app.show_timestamps))
            .collect()
    };

    let title = if app.log_scroll > 0 {
        format!(" Log ({} entries, {} newer below) ", total, app.log_scroll)
    } else {
        format!(" Log ({} entries) ", total)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn log_line(entry: &LogEntry, show_timestamps: bool) -> Line<'_> {
    let mut spans = Vec::with_capacity(4);
    if show_timestamps {
        spans.push(Span::styled(
            format!("[{}] ", entry.local_time()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        format!("{:<5} ", entry.level.as_str().to_uppercase()),
        Style::default().fg(level_color(entry.level)),
    ));
    spans.push(Span::raw(entry.message.as_str()));
    Line::from(spans)
}

/// Draw status bar
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let left = Span::styled(
        format!(" {} ", app.status_message),
        Style::default().fg(Color::White),
    );

    let convert_hint = if app.snapshot.can_convert() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let bar = Paragraph::new(Line::from(vec![
        left,
        Span::styled(" o:Folder  i:File  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Enter:Convert  ", convert_hint),
        Span::styled(
            "x:Clear  ?:Help  q:Quit ",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(bar, area);
}

fn draw_notification(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    kind: NotificationKind,
    message: &str,
) {
    let popup_area = popup_rect(area, 64, 9);
    frame.render_widget(Clear, popup_area);

    let (title, color) = match kind {
        NotificationKind::Success => (" SUCCESS ", Color::Green),
        NotificationKind::Error => (" ERROR ", Color::Red),
    };

    let mut hints = vec![Span::styled(
        "Enter/Esc: close",
        Style::default().fg(Color::DarkGray),
    )];
    if kind == NotificationKind::Success && app.snapshot.last_output_path.is_some() {
        hints.push(Span::styled(
            "   f: open folder",
            Style::default().fg(Color::Cyan),
        ));
    }

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(hints),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(1));

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn draw_prompt(frame: &mut Frame, area: Rect, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };

    let popup_area = popup_rect(area, 70, 7);
    frame.render_widget(Clear, popup_area);

    let hint = match prompt.kind {
        PromptKind::Folder => "Type a folder path",
        PromptKind::File => "Type a file path",
    };

    let text = vec![
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(prompt.input.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: confirm   Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", prompt.title))
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(1));

    frame.render_widget(Paragraph::new(text).block(block), popup_area);
}

/// Draw help overlay popup
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 56, 20);
    frame.render_widget(Clear, popup_area);

    let section = Style::default().fg(Color::Yellow);
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  KEYBOARD SHORTCUTS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("  Conversion", section)),
        Line::from("    o            Select output folder"),
        Line::from("    i            Select input file"),
        Line::from("    Enter / c    Convert"),
        Line::from("    f            Open output folder (on success popup)"),
        Line::from(""),
        Line::from(Span::styled("  Log", section)),
        Line::from("    j / k        Scroll down / up"),
        Line::from("    PgUp/PgDn    Page up / down"),
        Line::from("    g / G        Oldest / newest"),
        Line::from("    x            Clear log"),
        Line::from(""),
        Line::from(Span::styled("  General", section)),
        Line::from("    ?/F1         Show this help"),
        Line::from("    q/Esc        Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(1));

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

/// Centered popup no larger than the screen
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Long paths keep their first component and last two: `first/.../a/b`
pub fn shorten_path(path: &Path) -> String {
    let full = path.display().to_string();
    if full.chars().count() <= 50 {
        return full;
    }

    let parts: Vec<&str> = full.split(['/', '\\']).collect();
    if parts.len() <= 3 {
        return full;
    }

    format!(
        "{}/.../{}/{}",
        parts[0],
        parts[parts.len() - 2],
        parts[parts.len() - 1]
    )
}

fn status_color(status: &ConversionStatus) -> Color {
    match status {
        ConversionStatus::Idle => Color::DarkGray,
        ConversionStatus::AwaitingFolder | ConversionStatus::AwaitingFile => Color::White,
        ConversionStatus::Ready => Color::Cyan,
        ConversionStatus::Processing => Color::Yellow,
        ConversionStatus::Succeeded { .. } => Color::Green,
        ConversionStatus::Failed { .. } => Color::Red,
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug | LogLevel::Trace => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, Notification};
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_shorten_path() {
        let short = Path::new("/home/user/out");
        assert_eq!(shorten_path(short), "/home/user/out");

        let long = Path::new("/home/someone/projects/games/places/very/deep/folder/place.rbxl");
        assert_eq!(shorten_path(long), "/.../folder/place.rbxl");

        let relative = Path::new("workspace/aaaaaaaaaaaaaaaaaaaaaaaaa/bbbbbbbbbbbbbbbbbbbbbbbbbbbb/c");
        assert_eq!(shorten_path(relative), "workspace/.../bbbbbbbbbbbbbbbbbbbbbbbbbbbb/c");
    }

    #[test]
    fn test_shorten_path_keeps_few_components() {
        let name = format!("/{}/{}", "a".repeat(30), "b".repeat(30));
        assert_eq!(shorten_path(Path::new(&name)), name);
    }

    #[test]
    fn test_empty_log_shows_placeholder() {
        let app = App::new(true);
        let screen = render(&app);
        assert!(screen.contains(EMPTY_LOG_PLACEHOLDER));
        assert!(screen.contains("STARTING..."));
    }

    #[test]
    fn test_logs_and_notification_render() {
        let mut app = App::new(false);
        app.update_logs(Arc::new(vec![LogEntry::at(
            0,
            LogLevel::Info,
            "Opening input file...",
        )]));
        app.snapshot.selection.set_output_folder(PathBuf::from("/out"));
        app.snapshot.notification = Some(Notification::error("Conversion worker failed"));

        let screen = render(&app);
        assert!(screen.contains("Opening input file..."));
        assert!(!screen.contains(EMPTY_LOG_PLACEHOLDER));
        assert!(screen.contains("ERROR"));
        assert!(screen.contains("Conversion worker failed"));
    }
}
