// Game-over modal: winner announcement and final statistics. Closed locally
// with Esc; the rest of the dashboard keeps updating underneath.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use nightwatch_core::render::{GameSummary, Winner};

use super::centered_rect;

const DIALOG_WIDTH: u16 = 44;
const DIALOG_HEIGHT: u16 = 12;

pub fn render(frame: &mut Frame, area: Rect, summary: &GameSummary) {
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let color = winner_color(summary.winner);
    let label = Style::default().fg(Color::Gray);
    let stat = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(name, label), Span::raw(value)])
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            summary.announcement.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        stat("  Duration:      ", format!("{} days", summary.day_count)),
        stat("  Total players: ", summary.total_players.to_string()),
        stat("  Survivors:     ", summary.survivors.to_string()),
        stat("  Eliminated:    ", summary.eliminated.to_string()),
        stat("  Mafia:         ", summary.mafia_members.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Esc to close",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            " Game Over ",
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

fn winner_color(winner: Winner) -> Color {
    match winner {
        Winner::Mafia => Color::Red,
        Winner::Civilians => Color::Green,
    }
}
