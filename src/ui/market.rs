//! Market screen rendering
//!
//! Shows every indicator with its value, change and derived strength.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::status;
use pulseboard::data::{Indicator, MarketSnapshot};
use pulseboard::indicator::Tone;
use pulseboard::sync::SyncState;

/// Width of the strength bar in cells
const BAR_WIDTH: usize = 10;

/// Color for a tone
fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Green,
        Tone::Neutral => Color::Gray,
        Tone::Negative => Color::Red,
    }
}

/// Renders a 0-100 score as a bar of block characters
fn strength_bar(score: f64) -> String {
    let filled = ((score / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn indicator_row(indicator: &Indicator) -> Row<'static> {
    let derived = indicator.derived();
    let color = tone_color(derived.tone);

    Row::new(vec![
        Cell::from(Span::styled(
            indicator.name.clone(),
            Style::default().fg(Color::White),
        )),
        Cell::from(format!("{:.2} {}", indicator.value, indicator.unit)),
        Cell::from(Span::styled(
            format!("{:+.2}%", indicator.change_percent),
            Style::default().fg(color),
        )),
        Cell::from(Span::styled(
            format!("{} {}", derived.label.arrow(), derived.label.as_str()),
            Style::default().fg(color),
        )),
        Cell::from(Span::styled(
            strength_bar(derived.strength_score),
            Style::default().fg(color),
        )),
    ])
}

/// Renders the market screen into `area`
pub fn render(frame: &mut Frame, area: Rect, state: &SyncState<MarketSnapshot>) {
    let block = Block::default()
        .title(" Market ")
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

    let Some(snapshot) = &state.data else {
        frame.render_widget(status::placeholder(state, "market data"), body);
        return;
    };

    let header = Row::new(vec!["Indicator", "Value", "Change", "Trend", "Strength"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = snapshot.indicators.iter().map(indicator_row).collect();
    let widths = [
        Constraint::Min(16),
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Length(14),
        Constraint::Length(BAR_WIDTH as u16),
    ];

    let table = Table::new(rows, widths).header(header).column_spacing(2);
    frame.render_widget(table, body);
}

/// Line summarizing the snapshot for the header
pub fn summary(snapshot: &MarketSnapshot) -> Line<'static> {
    let rising = snapshot
        .indicators
        .iter()
        .filter(|i| i.derived().tone == Tone::Positive)
        .count();
    let falling = snapshot
        .indicators
        .iter()
        .filter(|i| i.derived().tone == Tone::Negative)
        .count();
    Line::from(vec![
        Span::styled(format!("{} ↑", rising), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("{} ↓", falling), Style::default().fg(Color::Red)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseboard::sync::SyncStatus;
    use ratatui::{backend::TestBackend, Terminal};

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            indicators: vec![
                Indicator {
                    code: "usd".to_string(),
                    name: "US Dollar".to_string(),
                    unit: "CLP".to_string(),
                    value: 945.3,
                    change_percent: 0.42,
                },
                Indicator {
                    code: "copper".to_string(),
                    name: "Copper".to_string(),
                    unit: "USD/lb".to_string(),
                    value: 4.12,
                    change_percent: -2.7,
                },
            ],
        }
    }

    fn draw(state: &SyncState<MarketSnapshot>) -> String {
        let backend = TestBackend::new(90, 12);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, area, state);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_strength_bar_scales_with_score() {
        assert_eq!(strength_bar(0.0), "░░░░░░░░░░");
        assert_eq!(strength_bar(50.0), "█████░░░░░");
        assert_eq!(strength_bar(100.0), "██████████");
    }

    #[test]
    fn test_renders_indicators_with_labels() {
        let state = SyncState {
            data: Some(snapshot()),
            status: SyncStatus::Ready,
            ..SyncState::default()
        };

        let content = draw(&state);

        assert!(content.contains("US Dollar"));
        assert!(content.contains("+0.42%"));
        assert!(content.contains("Rising"));
        assert!(content.contains("Strong fall"));
    }

    #[test]
    fn test_renders_loading_placeholder() {
        let state = SyncState {
            status: SyncStatus::Loading,
            ..SyncState::default()
        };

        assert!(draw(&state).contains("Loading market data"));
    }

    #[test]
    fn test_renders_banner_over_retained_data() {
        let state = SyncState {
            data: Some(snapshot()),
            status: SyncStatus::Ready,
            error: Some("Server responded with HTTP 503".to_string()),
            ..SyncState::default()
        };

        let content = draw(&state);

        assert!(content.contains("HTTP 503"));
        assert!(content.contains("Copper"));
    }

    #[test]
    fn test_summary_counts_directions() {
        let text: String = summary(&snapshot())
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(text.contains("1 ↑"));
        assert!(text.contains("1 ↓"));
    }
}
