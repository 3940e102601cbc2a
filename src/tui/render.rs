//! TUI rendering logic

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};
use ratatui::Frame;
use zmk_session::SessionStatus;

use crate::tui::app::App;

/// Render the entire application UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Device line
            Constraint::Length(3), // Slider
            Constraint::Min(3),    // Details
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    render_device(frame, app, chunks[0]);
    render_slider(frame, app, chunks[1]);
    render_details(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_device(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        SessionStatus::Bound(info) => Line::from(vec![
            Span::styled(
                info.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {:04x}:{:04x}  page 0x{:04x}  {}",
                info.vid, info.pid, info.usage_page, info.path
            )),
        ]),
        SessionStatus::Unbound => Line::from(Span::styled(
            "No device bound (press c to request one)",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" ZMK Slider "),
    );
    frame.render_widget(paragraph, area);
}

fn render_slider(frame: &mut Frame, app: &App, area: Rect) {
    let color = if !app.is_bound() {
        Color::DarkGray
    } else if app.dirty {
        Color::Yellow
    } else {
        Color::Green
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Value "))
        .gauge_style(Style::default().fg(color))
        .ratio(app.slider.ratio())
        .label(format!("{:>3}", app.slider.value()));
    frame.render_widget(gauge, area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let device_value = app
        .device_value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(format!("Device reports: {}", device_value)),
        Line::from(format!("Live mode: {}", if app.live { "on" } else { "off" })),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" State "));
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let conn = if app.is_bound() {
        Span::styled("Bound", Style::default().fg(Color::Green))
    } else {
        Span::styled("Unbound", Style::default().fg(Color::Red))
    };
    let dirty_marker = if app.dirty { " [*]" } else { "" };
    let message = app.status_message.as_deref().unwrap_or("");

    let status_line = Line::from(vec![
        Span::raw("["),
        conn,
        Span::raw("]"),
        Span::raw(dirty_marker),
        Span::raw(" "),
        Span::raw(message),
        Span::raw(" | "),
        Span::styled(
            "←/→ adjust | s save | r read | c connect | ? help | q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status_line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(50, 50, frame.area());
    let lines = vec![
        Line::from("←/h/-      decrease"),
        Line::from("→/l/+      increase"),
        Line::from("PgDn/PgUp  -/+ 16"),
        Line::from("Home/End   0 / 255"),
        Line::from("s/Enter    save value to device"),
        Line::from("r          ask device for its value"),
        Line::from("c          request a device"),
        Line::from("L          toggle live mode"),
        Line::from("q/Esc      quit"),
    ];
    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Help "));
    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
