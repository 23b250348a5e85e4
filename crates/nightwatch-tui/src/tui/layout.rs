// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------------------+
// | Status Bar (1 row)                                           |
// +----------------+-----------------------+---------------------+
// | Roster (fill)  | Vote Chart (50%)      | Timeline            |
// |                +-----------------------+                     |
// +- Stats (5) ----+ Vote List (50%)       |                     |
// +----------------+-----------------------+---------------------+
// | Chat (fill)                                                  |
// +--------------------------------------------------------------+
// | Help Bar (1 row)                                             |
// +--------------------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection, phase, day, counters, filter, start affordance.
    pub status_bar: Rect,
    pub roster: Rect,
    /// Below the roster: alive mafia, alive civilians, elimination rate.
    pub stats: Rect,
    pub vote_chart: Rect,
    pub vote_list: Rect,
    pub timeline: Rect,
    pub chat: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
///
/// The status and help bars are one row each; the rest is split between an
/// upper board (roster, votes, timeline) and the chat transcript.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),       // status bar
            Constraint::Percentage(55),  // board
            Constraint::Min(5),          // chat
            Constraint::Length(1),       // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let board = vertical[1];
    let chat = vertical[2];
    let help_bar = vertical[3];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(board);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(columns[0]);

    let votes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    AppLayout {
        status_bar,
        roster: left[0],
        stats: left[1],
        vote_chart: votes[0],
        vote_list: votes[1],
        timeline: columns[2],
        chat,
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
