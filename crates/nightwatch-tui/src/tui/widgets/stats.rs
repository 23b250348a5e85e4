// Stats widget: alive mafia, alive civilians, elimination rate.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Stats");

    let Some(stats) = &state.stats else {
        let paragraph = Paragraph::new("  No stats yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let row = |label: &'static str, value: String, color: Color| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(color)),
        ])
    };

    let lines = vec![
        row(" Mafia alive:     ", stats.alive_mafia.to_string(), Color::Red),
        row(" Civilians alive: ", stats.alive_civilians.to_string(), Color::Green),
        row(
            " Eliminated:      ",
            format!("{}%", stats.elimination_rate),
            Color::Yellow,
        ),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
