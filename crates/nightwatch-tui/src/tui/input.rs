// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the event
// loop, or into local ViewState mutations (scrolling, dialogs).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use nightwatch_core::protocol::UserCommand;
use nightwatch_core::state::chat::ChatFilter;

use super::ViewState;

/// Lines moved by PageUp/PageDown in the chat.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// event loop (start, stop, filter, quit). Returns `None` when the key was
/// handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.game_over.is_some() {
        return handle_game_over(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('s') => view_state.start_enabled.then_some(UserCommand::StartGame),
        KeyCode::Char('x') => Some(UserCommand::StopGame),

        // Chat filter: `f` cycles, 1-4 select directly
        KeyCode::Char('f') => Some(set_filter(view_state.chat_filter.next())),
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            ChatFilter::ALL.get(idx).map(|f| set_filter(*f))
        }

        // Chat scrolling
        KeyCode::Up | KeyCode::Char('k') => {
            scroll_back(view_state, 1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            scroll_forward(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_back(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_forward(view_state, PAGE_SIZE);
            None
        }
        KeyCode::End | KeyCode::Char('G') => {
            view_state.chat_scroll_back = 0;
            None
        }

        // Quit: enter confirmation mode instead of quitting immediately
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

/// In quit confirmation mode `y`/`q` confirm, `n`/`Esc` cancel, and
/// everything else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// While the game-over modal is open only dismissal and quit get through.
fn handle_game_over(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => {
            view_state.game_over = None;
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn set_filter(filter: ChatFilter) -> UserCommand {
    UserCommand::SetFilter(filter.tag().to_string())
}

/// Scroll toward older messages. Clamped so the oldest line stays reachable
/// but the view never scrolls past it.
fn scroll_back(view_state: &mut ViewState, lines: usize) {
    let max = view_state.chat_lines.len().saturating_sub(1);
    view_state.chat_scroll_back = view_state.chat_scroll_back.saturating_add(lines).min(max);
}

fn scroll_forward(view_state: &mut ViewState, lines: usize) {
    view_state.chat_scroll_back = view_state.chat_scroll_back.saturating_sub(lines);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
