//! Status line, freshness and error banner shared by both screens

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use pulseboard::freshness::age_seconds;
use pulseboard::sync::{SyncState, SyncStatus};

/// Formats an age in seconds as "just now", "42s ago", "5m ago", ...
pub fn format_age(seconds: u64) -> String {
    match seconds {
        0..=4 => "just now".to_string(),
        5..=59 => format!("{}s ago", seconds),
        60..=3_599 => format!("{}m ago", seconds / 60),
        3_600..=86_399 => format!("{}h ago", seconds / 3_600),
        _ => format!("{}d ago", seconds / 86_400),
    }
}

fn status_color(status: &SyncStatus) -> Color {
    match status {
        SyncStatus::Idle => Color::DarkGray,
        SyncStatus::Loading | SyncStatus::Refreshing => Color::Yellow,
        SyncStatus::Ready => Color::Green,
        SyncStatus::Error(_) => Color::Red,
    }
}

/// Builds the status line: status, data age and countdown
pub fn status_line<T>(state: &SyncState<T>, now: DateTime<Utc>, auto_refresh: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{} {}", if state.status.is_busy() { "◌" } else { "●" }, state.status.label()),
        Style::default().fg(status_color(&state.status)),
    )];

    if let Some(updated) = state.last_updated {
        spans.push(Span::styled(
            format!(" │ updated {}", format_age(age_seconds(updated, now))),
            Style::default().fg(Color::Gray),
        ));
    }

    let countdown = match (state.next_refresh_in_seconds, auto_refresh) {
        (Some(seconds), _) => format!(" │ next refresh in {}s", seconds),
        (None, true) => " │ auto-refresh pending".to_string(),
        (None, false) => " │ auto-refresh off".to_string(),
    };
    spans.push(Span::styled(countdown, Style::default().fg(Color::DarkGray)));

    Line::from(spans)
}

/// Warning shown above data kept from an earlier fetch
pub fn error_banner<T>(state: &SyncState<T>) -> Option<Line<'static>> {
    if !state.is_stale_with_error() {
        return None;
    }
    let error = state.error.clone().unwrap_or_default();
    Some(Line::from(vec![
        Span::styled(
            "⚠ Showing saved data: ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(error, Style::default().fg(Color::Yellow)),
    ]))
}

/// Centered message shown while a screen has no data
pub fn placeholder<T>(state: &SyncState<T>, what: &str) -> Paragraph<'static> {
    let lines = match &state.status {
        SyncStatus::Error(message) => vec![
            Line::from(Span::styled(
                format!("Could not load {}", what),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(
                "Press r to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        SyncStatus::Idle => vec![Line::from(Span::styled(
            "Waiting...",
            Style::default().fg(Color::DarkGray),
        ))],
        _ => vec![Line::from(Span::styled(
            format!("Loading {}...", what),
            Style::default().fg(Color::Cyan),
        ))],
    };

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

/// Renders the status line into `area`
pub fn render<T>(frame: &mut Frame, area: Rect, state: &SyncState<T>, now: DateTime<Utc>, auto_refresh: bool) {
    frame.render_widget(Paragraph::new(status_line(state, now, auto_refresh)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_age_buckets() {
        assert_eq!(format_age(0), "just now");
        assert_eq!(format_age(42), "42s ago");
        assert_eq!(format_age(125), "2m ago");
        assert_eq!(format_age(7_200), "2h ago");
        assert_eq!(format_age(200_000), "2d ago");
    }

    #[test]
    fn test_status_line_shows_age_and_countdown() {
        let state = SyncState {
            data: Some(1),
            status: SyncStatus::Ready,
            error: None,
            last_updated: Some(now() - Duration::seconds(42)),
            next_refresh_in_seconds: Some(17),
        };

        let text = line_text(&status_line(&state, now(), true));

        assert!(text.contains("● Ready"));
        assert!(text.contains("updated 42s ago"));
        assert!(text.contains("next refresh in 17s"));
    }

    #[test]
    fn test_status_line_without_countdown() {
        let state: SyncState<u32> = SyncState {
            status: SyncStatus::Loading,
            ..SyncState::default()
        };

        let text = line_text(&status_line(&state, now(), false));

        assert!(text.contains("◌ Loading"));
        assert!(!text.contains("updated"));
        assert!(text.contains("auto-refresh off"));
    }

    #[test]
    fn test_error_banner_only_with_retained_data() {
        let mut state = SyncState {
            data: Some(1),
            status: SyncStatus::Ready,
            error: Some("Network error: timed out".to_string()),
            ..SyncState::default()
        };
        let banner = error_banner(&state).expect("banner");
        assert!(line_text(&banner).contains("timed out"));

        state.data = None;
        assert!(error_banner(&state).is_none());
    }
}
