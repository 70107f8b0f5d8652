//! UI rendering module for Pulseboard
//!
//! Lays out the header tabs, the current screen, its status line and the key
//! hints, using the ratatui library for TUI components.

pub mod help_overlay;
pub mod market;
pub mod quotes;
pub mod status;

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use pulseboard::cli::Screen;

/// Renders the whole dashboard for the current frame
pub fn render(frame: &mut Frame, app: &App, now: DateTime<Utc>) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Min(3),    // Screen
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Market => {
            let state = app.market.state();
            market::render(frame, chunks[1], &state);
            status::render(frame, chunks[2], &state, now, app.market.is_auto_refresh_enabled());
        }
        Screen::Quotes => {
            let state = app.quotes.state();
            quotes::render(frame, chunks[1], &state);
            status::render(frame, chunks[2], &state, now, app.quotes.is_auto_refresh_enabled());
        }
    }

    render_footer(frame, app, chunks[3]);

    if app.show_help {
        help_overlay::render(frame);
    }
}

fn tab(screen: Screen, index: usize, current: Screen) -> Span<'static> {
    let label = format!(" {} {} ", index, screen.title());
    if screen == current {
        Span::styled(
            label,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(label, Style::default().fg(Color::Gray))
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "PULSEBOARD",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        tab(Screen::Market, 1, app.screen),
        Span::raw(" "),
        tab(Screen::Quotes, 2, app.screen),
    ];

    if let Some(snapshot) = app.market.state().data {
        spans.push(Span::raw("   "));
        spans.extend(market::summary(&snapshot).spans);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let auto_label = if app.auto_refresh_enabled() {
        " Auto-refresh on  "
    } else {
        " Auto-refresh off  "
    };

    let help_spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Switch  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("a", Style::default().fg(Color::Yellow)),
        Span::raw(auto_label),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
        Span::styled(
            format!(
                " │ Refreshed {}x, {} failed",
                app.stats.manual_refreshes, app.stats.failed_refreshes
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(help_spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
