// Timeline widget: the most recent game events, oldest first.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use nightwatch_core::render::TimelineEntry;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Timeline");

    if state.timeline.is_empty() {
        let paragraph = Paragraph::new("  No events yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Two lines per entry; when space runs out the newest entries win.
    let visible_entries = (area.height as usize).saturating_sub(2) / 2;
    let skip = state.timeline.len().saturating_sub(visible_entries.max(1));

    let items: Vec<ListItem> = state.timeline.iter().skip(skip).map(format_entry).collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn format_entry(entry: &TimelineEntry) -> ListItem<'static> {
    let mut header = vec![Span::styled(
        format!(" {}", entry.title),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(time) = &entry.time {
        header.push(Span::styled(
            format!("  {}", time),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let body = Line::from(Span::styled(
        format!("   {}", entry.description),
        Style::default().fg(Color::White),
    ));
    ListItem::new(vec![Line::from(header), body])
}
