//! Quotes screen rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::status;
use pulseboard::data::{Quote, QuoteFeed};
use pulseboard::sync::SyncState;

fn quote_lines(quote: &Quote) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("“{}”", quote.text.trim()),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            format!("    - {}", quote.author),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ]
}

/// Renders the quotes screen into `area`
pub fn render(frame: &mut Frame, area: Rect, state: &SyncState<QuoteFeed>) {
    let title = match &state.data {
        Some(feed) => format!(" Quotes ({}) ", feed.len()),
        None => " Quotes ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let body = match status::error_banner(state) {
        Some(banner) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(inner);
            frame.render_widget(Paragraph::new(banner), chunks[0]);
            chunks[1]
        }
        None => inner,
    };

    let Some(feed) = &state.data else {
        frame.render_widget(status::placeholder(state, "quotes"), body);
        return;
    };

    let lines: Vec<Line> = feed.quotes.iter().flat_map(quote_lines).collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, body);
}
