// Chat transcript widget.
//
// Shows the lines that pass the active filter, newest at the bottom. The view
// follows the tail unless the user has scrolled back; the title carries the
// filter and the size of the whole log.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use nightwatch_core::render::{ChatLine, Emphasis};

use super::roster::role_color;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut title = format!("Chat: {} ({})", state.chat_filter, state.chat_total);
    if state.chat_scroll_back > 0 {
        title.push_str(" [scrolled, End to follow]");
    }
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.chat_lines.is_empty() {
        let text = empty_text(state);
        let paragraph = Paragraph::new(format!("  {}", text))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let (start, end) = window(state.chat_lines.len(), visible_rows, state.chat_scroll_back);

    let items: Vec<ListItem> = state.chat_lines[start..end]
        .iter()
        .map(|line| ListItem::new(format_line(line)))
        .collect();
    frame.render_widget(List::new(items).block(block), area);

    let total = state.chat_lines.len();
    if total > visible_rows {
        let mut scrollbar_state =
            ScrollbarState::new(total.saturating_sub(visible_rows)).position(start);
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

fn empty_text(state: &ViewState) -> &'static str {
    if let Some(placeholder) = state.chat_placeholder {
        placeholder
    } else if state.chat_total > 0 {
        "No messages match this filter."
    } else {
        "No messages yet."
    }
}

/// Half-open range of line indices to show, `scroll_back` lines above the
/// tail.
fn window(len: usize, rows: usize, scroll_back: usize) -> (usize, usize) {
    let back = scroll_back.min(len.saturating_sub(1));
    let end = len - back;
    (end.saturating_sub(rows), end)
}

fn format_line(line: &ChatLine) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("[{}] ", line.time),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            line.sender.clone(),
            Style::default()
                .fg(role_color(line.sender_role))
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(marker) = line.marker() {
        spans.push(Span::raw(format!(" {}", marker)));
    }
    spans.push(Span::raw(": "));
    spans.extend(line.fragments.iter().map(|fragment| {
        let style = match fragment.emphasis {
            Emphasis::Plain => Style::default(),
            Emphasis::Bold => Style::default().add_modifier(Modifier::BOLD),
            Emphasis::Italic => Style::default().add_modifier(Modifier::ITALIC),
        };
        Span::styled(fragment.text.clone(), style)
    }));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::WELCOME_TEXT;
    use nightwatch_core::protocol::Role;
    use nightwatch_core::render::Fragment;
    use nightwatch_core::state::chat::{Channel, ChatFilter};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn line(seq: u64, sender: &str, role: Role, channel: Channel, text: &str) -> ChatLine {
        ChatLine {
            seq,
            sender: sender.into(),
            sender_role: role,
            channel,
            fragments: vec![
                Fragment {
                    text: text.into(),
                    emphasis: Emphasis::Plain,
                },
                Fragment {
                    text: "!".into(),
                    emphasis: Emphasis::Bold,
                },
            ],
            time: "20:15:00".into(),
        }
    }

    fn rendered(state: &ViewState, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, height)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn state_with(count: u64) -> ViewState {
        let mut state = ViewState::default();
        state.chat_lines = (0..count)
            .map(|i| line(i, "Alice", Role::Civilian, Channel::Public, &format!("msg {i:02}")))
            .collect();
        state.chat_total = count as usize;
        state
    }

    #[test]
    fn window_follows_tail_and_scrolls_back() {
        assert_eq!(window(30, 10, 0), (20, 30));
        assert_eq!(window(30, 10, 5), (15, 25));
        assert_eq!(window(30, 10, 100), (0, 1));
        assert_eq!(window(4, 10, 0), (0, 4));
    }

    #[test]
    fn line_shows_time_sender_and_fragments() {
        let state = state_with(1);
        let text = rendered(&state, 5);
        assert!(text.contains("[20:15:00] Alice: msg 00!"));
        assert!(text.contains("Chat: all (1)"));
    }

    #[test]
    fn tail_is_visible_by_default() {
        let state = state_with(20);
        let text = rendered(&state, 7);
        assert!(text.contains("msg 19"));
        assert!(text.contains("msg 15"));
        assert!(!text.contains("msg 14"));
    }

    #[test]
    fn scrolled_back_view_shows_older_lines() {
        let mut state = state_with(20);
        state.chat_scroll_back = 10;
        let text = rendered(&state, 7);
        assert!(text.contains("msg 09"));
        assert!(!text.contains("msg 19"));
        assert!(text.contains("End to follow"));
    }

    #[test]
    fn mafia_lines_carry_marker() {
        let mut state = ViewState::default();
        state.chat_lines = vec![line(0, "Eve", Role::Mafia, Channel::Mafia, "tonight")];
        state.chat_total = 1;
        state.chat_filter = ChatFilter::Mafia;
        let text = rendered(&state, 5);
        assert!(text.contains("Chat: mafia (1)"));
        assert!(text.contains("Eve"));
        assert!(text.contains("tonight!"));
    }

    #[test]
    fn empty_chat_placeholders() {
        let mut state = ViewState::default();
        assert!(rendered(&state, 5).contains("No messages yet."));

        state.chat_total = 3;
        assert!(rendered(&state, 5).contains("No messages match this filter."));

        state.chat_placeholder = Some(WELCOME_TEXT);
        assert!(rendered(&state, 5).contains("Game Starting..."));
    }
}
