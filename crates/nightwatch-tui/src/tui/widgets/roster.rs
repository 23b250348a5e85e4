// Roster widget: one row per player with role, status and votes received.
// Eliminated players stay listed, struck through.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use nightwatch_core::protocol::{PlayerStatus, Role};
use nightwatch_core::render::RosterRow;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    if state.roster.is_empty() {
        let paragraph = Paragraph::new("  No players yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Players"));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2);
    let total = state.roster.len();

    let items: Vec<ListItem> = state
        .roster
        .iter()
        .take(visible_rows.max(1))
        .map(format_row)
        .collect();

    let alive = state
        .roster
        .iter()
        .filter(|r| r.status == PlayerStatus::Alive)
        .count();
    let title = format!("Players ({}/{})", alive, total);

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);

    if total > visible_rows {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(visible_rows));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// Display color for a role, shared with the chat sender styling.
pub fn role_color(role: Role) -> Color {
    match role {
        Role::Mafia => Color::Red,
        Role::Detective => Color::Cyan,
        Role::Doctor => Color::Green,
        Role::Narrator => Color::Magenta,
        Role::Civilian => Color::White,
        Role::Unknown => Color::Gray,
    }
}

fn format_row(row: &RosterRow) -> ListItem<'static> {
    let eliminated = row.status == PlayerStatus::Eliminated;
    let mut name_style = Style::default()
        .fg(role_color(row.role))
        .add_modifier(Modifier::BOLD);
    if eliminated {
        name_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }

    let (marker, marker_color) = if eliminated {
        ("✗", Color::DarkGray)
    } else {
        ("●", Color::Green)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", marker), Style::default().fg(marker_color)),
        Span::styled(row.name.clone(), name_style),
        Span::styled(
            format!(" {}", row.role.as_str()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if row.votes_received > 0 {
        spans.push(Span::styled(
            format!(" [{}]", row.votes_received),
            Style::default().fg(Color::Yellow),
        ));
    }
    ListItem::new(Line::from(spans))
}
