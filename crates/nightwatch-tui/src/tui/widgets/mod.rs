// Widget implementations for each dashboard region.

pub mod chat;
pub mod game_over;
pub mod quit_confirm;
pub mod roster;
pub mod stats;
pub mod status_bar;
pub mod timeline;
pub mod toast;
pub mod vote_chart;
pub mod vote_list;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the rectangle is clamped to the available space.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_centered() {
        let area = Rect::new(0, 0, 80, 24);
        let result = centered_rect(28, 6, area);
        assert_eq!(result.width, 28);
        assert_eq!(result.height, 6);
        assert!((result.x + result.width / 2).abs_diff(area.width / 2) <= 1);
        assert!((result.y + result.height / 2).abs_diff(area.height / 2) <= 1);
    }

    #[test]
    fn centered_rect_clamps_to_small_area() {
        let area = Rect::new(0, 0, 10, 3);
        let result = centered_rect(28, 6, area);
        assert!(result.width <= area.width);
        assert!(result.height <= area.height);
    }
}
