// Toast overlay: transient notifications stacked in the top-right corner,
// newest on top. Expiry is driven by the event loop.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use nightwatch_core::render::{Toast, ToastLevel};

use crate::tui::ViewState;

const TOAST_HEIGHT: u16 = 3;
const MAX_TOAST_WIDTH: u16 = 60;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    // Skip the status bar row.
    let mut y = area.y.saturating_add(1);
    for toast in state.toasts.iter().rev() {
        if y.saturating_add(TOAST_HEIGHT) > area.bottom() {
            break;
        }
        let rect = toast_rect(toast, area, y);
        frame.render_widget(Clear, rect);
        frame.render_widget(toast_widget(toast), rect);
        y += TOAST_HEIGHT;
    }
}

pub fn level_color(level: ToastLevel) -> Color {
    match level {
        ToastLevel::Info => Color::Cyan,
        ToastLevel::Success => Color::Green,
        ToastLevel::Warning => Color::Yellow,
        ToastLevel::Error => Color::Red,
    }
}

fn toast_rect(toast: &Toast, area: Rect, y: u16) -> Rect {
    let wanted = u16::try_from(toast.text.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(4);
    let width = wanted.min(MAX_TOAST_WIDTH).min(area.width);
    Rect::new(area.right().saturating_sub(width), y, width, TOAST_HEIGHT)
}

fn toast_widget(toast: &Toast) -> Paragraph<'_> {
    let color = level_color(toast.level);
    Paragraph::new(Span::styled(format!(" {}", toast.text), Style::default().fg(color)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .style(Style::default().bg(Color::Black))
}
