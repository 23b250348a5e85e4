// Vote list widget: current voter -> target edges. Votes that arrived in the
// latest snapshot stay highlighted until their highlight expires.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

use nightwatch_core::render::{VoteListView, VoteRow};

use crate::tui::ViewState;

/// Banner shown during the day while nobody has voted.
pub const WAITING_TEXT: &str = "Waiting for votes...";

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut items = Vec::new();

    if state.voting_indicator {
        items.push(ListItem::new(Line::from(Span::styled(
            format!(" {}", WAITING_TEXT),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),
        ))));
    }

    let count = match &state.vote_list {
        VoteListView::NoVotes => {
            items.push(ListItem::new(Line::from(Span::styled(
                format!(" {}", VoteListView::PLACEHOLDER),
                Style::default().fg(Color::DarkGray),
            ))));
            0
        }
        VoteListView::Entries(rows) => {
            items.extend(rows.iter().map(format_row));
            rows.len()
        }
    };

    let title = format!("Votes ({})", count);
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn format_row(row: &VoteRow) -> ListItem<'static> {
    let mut spans = vec![Span::raw(" "), Span::raw(row.label())];
    if row.highlighted {
        spans[1].style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        spans.push(Span::styled(
            " NEW",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow),
        ));
    }
    ListItem::new(Line::from(spans))
}
