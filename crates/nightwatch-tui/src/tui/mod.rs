// Spectator dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the last value pushed into every view
// region. The event loop in nightwatch-core sends `UiUpdate` messages over an
// mpsc channel; the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use nightwatch_core::protocol::{ConnectionStatus, UiUpdate, UserCommand};
use nightwatch_core::render::{
    ChatLine, GameSummary, RosterRow, StatsView, StatusView, TimelineEntry, Toast, VoteChart,
    VoteListView,
};
use nightwatch_core::state::chat::ChatFilter;

use layout::{build_layout, AppLayout};

/// Shown in the chat region right after a game starts and the log is wiped.
pub const WELCOME_TEXT: &str = "Game Starting... AI agents are being initialized...";

/// Oldest toasts are dropped beyond this many on screen.
const MAX_TOASTS: usize = 4;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local copy of every view region.
///
/// Updated incrementally via `UiUpdate` messages; regions an update does not
/// name keep their contents. `render_frame` only reads this struct.
pub struct ViewState {
    pub connection_status: ConnectionStatus,
    pub status: StatusView,
    pub roster: Vec<RosterRow>,
    pub vote_chart: VoteChart,
    pub vote_list: VoteListView,
    /// "Waiting for votes" banner above the vote list.
    pub voting_indicator: bool,
    pub stats: Option<StatsView>,
    pub timeline: Vec<TimelineEntry>,
    /// Chat lines passing the active filter, oldest first.
    pub chat_lines: Vec<ChatLine>,
    /// Length of the whole chat log, regardless of filter.
    pub chat_total: usize,
    pub chat_filter: ChatFilter,
    /// Placeholder shown while the chat is empty after a game start.
    pub chat_placeholder: Option<&'static str>,
    /// Lines scrolled back from the newest message; 0 follows the tail.
    pub chat_scroll_back: usize,
    pub toasts: Vec<Toast>,
    /// Whether the start key is currently accepted.
    pub start_enabled: bool,
    /// Open game-over modal, if any.
    pub game_over: Option<GameSummary>,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            connection_status: ConnectionStatus::Disconnected,
            status: StatusView::default(),
            roster: Vec::new(),
            vote_chart: VoteChart::default(),
            vote_list: VoteListView::NoVotes,
            voting_indicator: false,
            stats: None,
            timeline: Vec::new(),
            chat_lines: Vec::new(),
            chat_total: 0,
            chat_filter: ChatFilter::All,
            chat_placeholder: None,
            chat_scroll_back: 0,
            toasts: Vec::new(),
            start_enabled: true,
            game_over: None,
            confirm_quit: false,
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
        }
        UiUpdate::Status(status) => {
            state.status = status;
        }
        UiUpdate::Roster(rows) => {
            state.roster = rows;
        }
        UiUpdate::VoteChart(chart) => {
            state.vote_chart = chart;
        }
        UiUpdate::VoteList(list) => {
            state.vote_list = list;
        }
        UiUpdate::VoteHighlightCleared(edge) => {
            if let VoteListView::Entries(rows) = &mut state.vote_list {
                for row in rows.iter_mut().filter(|r| r.edge == edge) {
                    row.highlighted = false;
                }
            }
        }
        UiUpdate::VotingIndicator(visible) => {
            state.voting_indicator = visible;
        }
        UiUpdate::Stats(stats) => {
            state.stats = Some(stats);
        }
        UiUpdate::Timeline(entries) => {
            state.timeline = entries;
        }
        UiUpdate::ChatAppended {
            line,
            visible,
            total,
        } => {
            state.chat_total = total;
            state.chat_placeholder = None;
            if visible {
                state.chat_lines.push(line);
                // Keep a scrolled-back view anchored on the same lines.
                if state.chat_scroll_back > 0 {
                    state.chat_scroll_back += 1;
                }
            }
        }
        UiUpdate::ChatReplaced {
            filter,
            lines,
            total,
        } => {
            state.chat_filter = filter;
            state.chat_lines = lines;
            state.chat_total = total;
            state.chat_scroll_back = 0;
        }
        UiUpdate::ChatCleared => {
            state.chat_lines.clear();
            state.chat_total = 0;
            state.chat_scroll_back = 0;
            state.chat_placeholder = Some(WELCOME_TEXT);
        }
        UiUpdate::Toast(toast) => {
            state.toasts.push(toast);
            if state.toasts.len() > MAX_TOASTS {
                let excess = state.toasts.len() - MAX_TOASTS;
                state.toasts.drain(..excess);
            }
        }
        UiUpdate::ToastExpired(id) => {
            state.toasts.retain(|t| t.id != id);
        }
        UiUpdate::StartAffordance { enabled } => {
            state.start_enabled = enabled;
        }
        UiUpdate::GameOver(summary) => {
            state.game_over = Some(*summary);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame, overlays last.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::roster::render(frame, layout.roster, state);
    widgets::stats::render(frame, layout.stats, state);
    widgets::vote_chart::render(frame, layout.vote_chart, state);
    widgets::vote_list::render(frame, layout.vote_list, state);
    widgets::timeline::render(frame, layout.timeline, state);
    widgets::chat::render(frame, layout.chat, state);
    render_help_bar(frame, &layout);

    widgets::toast::render(frame, frame.area(), state);

    if let Some(summary) = &state.game_over {
        widgets::game_over::render(frame, frame.area(), summary);
    }
    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " s:Start | x:Stop | f/1-4:Filter | \u{2191}\u{2193}:Scroll | End:Follow | q:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // Event loop is gone: nothing more will ever change.
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            // A closed channel means the event loop already stopped.
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse, focus and resize events: the next tick redraws.
                    }
                    Some(Err(e)) => break Err(anyhow::Error::new(e).context("terminal input failed")),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(anyhow::Error::new(e).context("failed to draw frame"));
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nightwatch_core::protocol::{Phase, PlayerStatus, Role};
    use nightwatch_core::render::{Emphasis, Fragment, ToastLevel, VoteRow, Winner};
    use nightwatch_core::state::chat::Channel;
    use nightwatch_core::state::votes::VoteEdge;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn chat_line(seq: u64, sender: &str, text: &str) -> ChatLine {
        ChatLine {
            seq,
            sender: sender.to_string(),
            sender_role: Role::Civilian,
            channel: Channel::Public,
            fragments: vec![Fragment {
                text: text.to_string(),
                emphasis: Emphasis::Plain,
            }],
            time: "12:00:00".to_string(),
        }
    }

    fn toast(id: u64, text: &str) -> Toast {
        Toast {
            id,
            level: ToastLevel::Info,
            text: text.to_string(),
        }
    }

    fn summary() -> GameSummary {
        GameSummary {
            winner: Winner::Mafia,
            announcement: "MAFIA VICTORY!".to_string(),
            day_count: 5,
            total_players: 7,
            survivors: 3,
            eliminated: 4,
            mafia_members: "Eve, Frank".to_string(),
        }
    }

    fn screen_text(state: &ViewState, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_frame(frame, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(state.vote_list, VoteListView::NoVotes);
        assert!(state.roster.is_empty());
        assert!(state.stats.is_none());
        assert!(state.chat_lines.is_empty());
        assert_eq!(state.chat_filter, ChatFilter::All);
        assert!(state.start_enabled);
        assert!(state.game_over.is_none());
        assert!(!state.confirm_quit);
    }

    #[test]
    fn status_update_replaces_counters() {
        let mut state = ViewState::default();
        let status = StatusView {
            phase: Some(Phase::Day),
            day_count: Some(2),
            alive: Some(5),
            eliminated: Some(1),
        };
        apply_ui_update(&mut state, UiUpdate::Status(status.clone()));
        assert_eq!(state.status, status);
    }

    #[test]
    fn chat_append_respects_visibility_but_counts_everything() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::ChatAppended {
                line: chat_line(0, "Alice", "hello"),
                visible: true,
                total: 1,
            },
        );
        apply_ui_update(
            &mut state,
            UiUpdate::ChatAppended {
                line: chat_line(1, "Bob", "psst"),
                visible: false,
                total: 2,
            },
        );
        assert_eq!(state.chat_lines.len(), 1);
        assert_eq!(state.chat_lines[0].sender, "Alice");
        assert_eq!(state.chat_total, 2);
    }

    #[test]
    fn chat_append_keeps_scrolled_back_view_anchored() {
        let mut state = ViewState::default();
        state.chat_scroll_back = 3;
        apply_ui_update(
            &mut state,
            UiUpdate::ChatAppended {
                line: chat_line(0, "Alice", "hi"),
                visible: true,
                total: 1,
            },
        );
        assert_eq!(state.chat_scroll_back, 4);
    }

    #[test]
    fn chat_replaced_switches_filter_and_refollows() {
        let mut state = ViewState::default();
        state.chat_scroll_back = 5;
        apply_ui_update(
            &mut state,
            UiUpdate::ChatReplaced {
                filter: ChatFilter::Mafia,
                lines: vec![chat_line(3, "Eve", "tonight")],
                total: 9,
            },
        );
        assert_eq!(state.chat_filter, ChatFilter::Mafia);
        assert_eq!(state.chat_lines.len(), 1);
        assert_eq!(state.chat_total, 9);
        assert_eq!(state.chat_scroll_back, 0);
    }

    #[test]
    fn chat_cleared_shows_welcome_until_first_message() {
        let mut state = ViewState::default();
        state.chat_lines.push(chat_line(0, "Alice", "old"));
        state.chat_total = 1;
        apply_ui_update(&mut state, UiUpdate::ChatCleared);
        assert!(state.chat_lines.is_empty());
        assert_eq!(state.chat_total, 0);
        assert_eq!(state.chat_placeholder, Some(WELCOME_TEXT));

        apply_ui_update(
            &mut state,
            UiUpdate::ChatAppended {
                line: chat_line(0, "Narrator", "Night falls"),
                visible: true,
                total: 1,
            },
        );
        assert!(state.chat_placeholder.is_none());
    }

    #[test]
    fn highlight_cleared_only_touches_matching_edge() {
        let mut state = ViewState::default();
        state.vote_list = VoteListView::Entries(vec![
            VoteRow {
                edge: VoteEdge::new("Alice", "Bob"),
                highlighted: true,
            },
            VoteRow {
                edge: VoteEdge::new("Carol", "Bob"),
                highlighted: true,
            },
        ]);
        apply_ui_update(
            &mut state,
            UiUpdate::VoteHighlightCleared(VoteEdge::new("Alice", "Bob")),
        );
        let VoteListView::Entries(rows) = &state.vote_list else {
            panic!("expected entries");
        };
        assert!(!rows[0].highlighted);
        assert!(rows[1].highlighted);
    }

    #[test]
    fn highlight_cleared_on_placeholder_is_noop() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::VoteHighlightCleared(VoteEdge::new("Alice", "Bob")),
        );
        assert_eq!(state.vote_list, VoteListView::NoVotes);
    }

    #[test]
    fn toasts_expire_by_id_and_are_capped() {
        let mut state = ViewState::default();
        for id in 0..6 {
            apply_ui_update(&mut state, UiUpdate::Toast(toast(id, "x")));
        }
        assert_eq!(state.toasts.len(), MAX_TOASTS);
        assert_eq!(state.toasts[0].id, 2);

        apply_ui_update(&mut state, UiUpdate::ToastExpired(3));
        assert!(state.toasts.iter().all(|t| t.id != 3));
        assert_eq!(state.toasts.len(), MAX_TOASTS - 1);
    }

    #[test]
    fn start_affordance_and_game_over_are_stored() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::StartAffordance { enabled: false });
        assert!(!state.start_enabled);
        apply_ui_update(&mut state, UiUpdate::GameOver(Box::new(summary())));
        assert_eq!(state.game_over, Some(summary()));
    }

    #[test]
    fn roster_and_indicator_updates_are_stored() {
        let mut state = ViewState::default();
        let rows = vec![RosterRow {
            name: "Alice".into(),
            role: Role::Detective,
            status: PlayerStatus::Alive,
            votes_received: 1,
        }];
        apply_ui_update(&mut state, UiUpdate::Roster(rows.clone()));
        apply_ui_update(&mut state, UiUpdate::VotingIndicator(true));
        assert_eq!(state.roster, rows);
        assert!(state.voting_indicator);
    }

    #[test]
    fn render_frame_does_not_panic_on_default_state() {
        let state = ViewState::default();
        screen_text(&state, 160, 50);
        screen_text(&state, 40, 12);
    }

    #[test]
    fn render_frame_shows_vote_placeholder() {
        let state = ViewState::default();
        let text = screen_text(&state, 160, 50);
        assert!(text.contains(VoteListView::PLACEHOLDER));
    }

    #[test]
    fn render_frame_draws_game_over_modal() {
        let mut state = ViewState::default();
        state.game_over = Some(summary());
        let text = screen_text(&state, 160, 50);
        assert!(text.contains("MAFIA VICTORY!"));
        assert!(text.contains("Eve, Frank"));
    }

    #[test]
    fn render_frame_draws_quit_dialog() {
        let mut state = ViewState::default();
        state.confirm_quit = true;
        let text = screen_text(&state, 160, 50);
        assert!(text.contains("Really quit?"));
    }
}
