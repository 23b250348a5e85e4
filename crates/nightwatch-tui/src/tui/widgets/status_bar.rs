// Status bar widget: connection, phase, day, player counters, chat filter
// and whether a start request is currently accepted.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use nightwatch_core::protocol::{ConnectionStatus, Phase};

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [dot] PHASE | Day N | Alive N | Eliminated N | Chat: tag | start
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color) = connection_indicator(state.connection_status);
    spans.push(Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)));

    let status = &state.status;
    let phase = status.phase;
    spans.push(Span::styled(
        phase_label(phase),
        Style::default()
            .fg(phase_color(phase))
            .add_modifier(Modifier::BOLD),
    ));

    let counters = [
        ("Day", status.day_count),
        ("Alive", status.alive),
        ("Eliminated", status.eliminated),
    ];
    for (label, value) in counters {
        spans.push(separator());
        spans.push(Span::styled(
            format!("{} {}", label, counter(value)),
            Style::default().fg(Color::White),
        ));
    }

    spans.push(separator());
    spans.push(Span::styled(
        format!("Chat: {}", state.chat_filter),
        Style::default().fg(Color::Cyan),
    ));

    spans.push(separator());
    spans.push(start_affordance(state.start_enabled));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the connection dot character and its color.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color) {
    match status {
        ConnectionStatus::Connected => ("●", Color::Green),
        ConnectionStatus::Disconnected => ("●", Color::Red),
    }
}

fn phase_label(phase: Option<Phase>) -> String {
    match phase {
        Some(phase) => phase.label().to_uppercase(),
        None => "--".to_string(),
    }
}

fn phase_color(phase: Option<Phase>) -> Color {
    match phase {
        Some(Phase::Day) => Color::Yellow,
        Some(Phase::Night) => Color::Blue,
        Some(Phase::Voting) => Color::Magenta,
        Some(Phase::Ended) => Color::Red,
        Some(Phase::Lobby) | None => Color::Gray,
    }
}

fn counter(value: Option<u32>) -> String {
    value.map_or_else(|| "--".to_string(), |v| v.to_string())
}

fn start_affordance(enabled: bool) -> Span<'static> {
    if enabled {
        Span::styled("[s] Start", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            "Starting...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
    }
}

fn separator() -> Span<'static> {
    Span::styled(" | ", Style::default().fg(Color::Gray))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
