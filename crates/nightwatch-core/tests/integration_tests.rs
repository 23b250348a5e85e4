// Integration tests for the spectator pipeline.
//
// These drive the public API end to end: raw server frames go in through the
// event loop (or a `Spectator` directly), and the resulting `UiUpdate`s and
// outbound commands are checked.

use std::time::Duration;

use nightwatch_core::app::{self, Spectator};
use nightwatch_core::config::Config;
use nightwatch_core::protocol::*;
use nightwatch_core::render::{VoteListView, Winner};
use nightwatch_core::state::chat::ChatFilter;
use nightwatch_core::ws_client::WsEvent;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;

// ===========================================================================
// Test helpers
// ===========================================================================

fn frame(event: &str, data: Value) -> WsEvent {
    WsEvent::Message(json!({"event": event, "data": data}).to_string())
}

fn update(kind: &str, data: Value) -> WsEvent {
    frame("game_update", json!({"type": kind, "data": data}))
}

fn chat(sender: &str, chat_type: &str, text: &str) -> WsEvent {
    update(
        "new_message",
        json!({"sender": sender, "message": text, "chat_type": chat_type,
               "timestamp": "2024-05-01T21:00:00"}),
    )
}

fn spectator() -> (Spectator, mpsc::Receiver<OutboundCommand>) {
    let (out_tx, out_rx) = mpsc::channel(16);
    (Spectator::new(Config::default(), out_tx), out_rx)
}

fn vote_list(updates: &[UiUpdate]) -> Option<&VoteListView> {
    updates.iter().find_map(|u| match u {
        UiUpdate::VoteList(list) => Some(list),
        _ => None,
    })
}

fn voting_indicator(updates: &[UiUpdate]) -> Option<bool> {
    updates.iter().find_map(|u| match u {
        UiUpdate::VotingIndicator(shown) => Some(*shown),
        _ => None,
    })
}

/// Receive UI updates until one satisfies `pred`, skipping the rest.
async fn recv_until<F>(ui_rx: &mut mpsc::Receiver<UiUpdate>, mut pred: F) -> UiUpdate
where
    F: FnMut(&UiUpdate) -> bool,
{
    loop {
        let update = tokio::time::timeout(Duration::from_secs(5), ui_rx.recv())
            .await
            .expect("timed out waiting for UI update")
            .expect("UI channel closed");
        if pred(&update) {
            return update;
        }
    }
}

// ===========================================================================
// Scenario: voting round
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn voting_round_from_empty_to_first_vote() {
    let (mut state, _out) = spectator();
    let now = Instant::now();

    // Day starts, nobody has voted.
    let updates = state
        .handle_ws_event(frame("game_state", json!({"phase": "day", "votes": {}})), now)
        .await;
    assert_eq!(vote_list(&updates), Some(&VoteListView::NoVotes));
    assert_eq!(voting_indicator(&updates), Some(true));

    // First vote arrives and is highlighted.
    let updates = state
        .handle_ws_event(frame("game_state", json!({"votes": {"Alice": "Bob"}})), now)
        .await;
    match vote_list(&updates) {
        Some(VoteListView::Entries(rows)) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].label(), "Alice -> Bob");
            assert!(rows[0].highlighted);
        }
        other => panic!("expected one vote entry, got {:?}", other),
    }
    assert_eq!(voting_indicator(&updates), Some(false));

    // The identical map again: the edge is no longer new, so its highlight
    // drops without waiting for the timer.
    let updates = state
        .handle_ws_event(frame("game_state", json!({"votes": {"Alice": "Bob"}})), now)
        .await;
    assert!(matches!(
        &updates[..],
        [UiUpdate::VoteHighlightCleared(edge)] if edge.voter == "Alice" && edge.target == "Bob"
    ));

    // Once settled, a further repeat has nothing to redraw.
    let updates = state
        .handle_ws_event(frame("game_state", json!({"votes": {"Alice": "Bob"}})), now)
        .await;
    assert!(updates.is_empty());
    assert!(state.tick(now + Duration::from_secs(5)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_vote_map_starts_a_new_round() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    let both = json!({"votes": {"Alice": "Bob", "Carol": "Bob"}});

    state.handle_ws_event(frame("game_state", both.clone()), now).await;
    state
        .handle_ws_event(frame("game_state", json!({"votes": {}})), now)
        .await;
    let updates = state.handle_ws_event(frame("game_state", both), now).await;

    match vote_list(&updates) {
        Some(VoteListView::Entries(rows)) => assert!(rows.iter().all(|r| r.highlighted)),
        other => panic!("expected entries, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn vote_highlight_clears_after_two_seconds() {
    let (mut state, _out) = spectator();
    let t0 = Instant::now();
    state
        .handle_ws_event(frame("game_state", json!({"votes": {"Alice": "Bob"}})), t0)
        .await;

    assert!(state.tick(t0 + Duration::from_millis(1999)).is_empty());
    let cleared = state.tick(t0 + Duration::from_secs(2));
    assert!(matches!(
        &cleared[..],
        [UiUpdate::VoteHighlightCleared(edge)] if edge.voter == "Alice" && edge.target == "Bob"
    ));
}

// ===========================================================================
// Scenario: chat filtering
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn unknown_or_missing_channel_only_shows_unfiltered() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    state.handle_ws_event(chat("Eve", "whisper", "psst"), now).await;
    state
        .handle_ws_event(
            update("new_message", json!({"sender": "Bob", "message": "hello"})),
            now,
        )
        .await;

    let visible_under = |updates: Vec<UiUpdate>| match updates.into_iter().next() {
        Some(UiUpdate::ChatReplaced { lines, .. }) => lines.len(),
        other => panic!("expected ChatReplaced, got {:?}", other),
    };

    for filter in ["public", "mafia", "narrator"] {
        let updates = state
            .handle_user_command(UserCommand::SetFilter(filter.into()), now)
            .await;
        assert_eq!(visible_under(updates), 0, "filter {filter}");
    }
    let all = state
        .handle_user_command(UserCommand::SetFilter("all".into()), now)
        .await;
    assert_eq!(visible_under(all), 2);
}

#[tokio::test(start_paused = true)]
async fn mafia_message_under_each_filter() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    state.handle_ws_event(chat("Eve", "mafia", "Target Bob"), now).await;

    let visible_under = |updates: Vec<UiUpdate>| match updates.into_iter().next() {
        Some(UiUpdate::ChatReplaced { lines, .. }) => lines.len(),
        other => panic!("expected ChatReplaced, got {:?}", other),
    };

    let public = state
        .handle_user_command(UserCommand::SetFilter("public".into()), now)
        .await;
    assert_eq!(visible_under(public), 0);

    let mafia = state
        .handle_user_command(UserCommand::SetFilter("mafia".into()), now)
        .await;
    assert_eq!(visible_under(mafia), 1);

    let all = state
        .handle_user_command(UserCommand::SetFilter("all".into()), now)
        .await;
    assert_eq!(visible_under(all), 1);

    // Filtering never touched the log.
    assert_eq!(state.chat.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn narrator_filter_selects_by_sender() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    state.handle_ws_event(chat("Narrator", "public", "Dawn breaks"), now).await;
    state.handle_ws_event(chat("Alice", "public", "Morning"), now).await;

    let updates = state
        .handle_user_command(UserCommand::SetFilter("narrator".into()), now)
        .await;
    match &updates[..] {
        [UiUpdate::ChatReplaced { filter, lines, total }] => {
            assert_eq!(*filter, ChatFilter::Narrator);
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].sender, "Narrator");
            assert_eq!(*total, 2);
        }
        other => panic!("expected ChatReplaced, got {:?}", other),
    }
}

// ===========================================================================
// Scenario: game over
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn game_over_shows_mafia_victory() {
    let (mut state, _out) = spectator();
    let updates = state
        .handle_ws_event(
            frame(
                "game_over",
                json!({"winner": "mafia", "stats": {
                    "day_count": 5, "total_alive": 3, "eliminated_count": 4,
                    "mafia_members": ["Eve", "Frank"]
                }}),
            ),
            Instant::now(),
        )
        .await;

    match &updates[..] {
        [UiUpdate::GameOver(summary)] => {
            assert_eq!(summary.winner, Winner::Mafia);
            assert_eq!(summary.announcement, "MAFIA VICTORY!");
            assert_eq!(summary.mafia_members, "Eve, Frank");
            assert_eq!(summary.total_players, 7);
            assert_eq!(summary.day_count, 5);
        }
        other => panic!("expected GameOver, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn game_over_with_bad_mafia_entry_still_names_the_winner() {
    let (mut state, _out) = spectator();
    let updates = state
        .handle_ws_event(
            frame(
                "game_over",
                json!({"winner": "mafia", "stats": {
                    "day_count": 5, "total_alive": 3, "eliminated_count": 4,
                    "mafia_members": ["Eve", null]
                }}),
            ),
            Instant::now(),
        )
        .await;

    match &updates[..] {
        [UiUpdate::GameOver(summary)] => {
            assert_eq!(summary.winner, Winner::Mafia);
            assert_eq!(summary.day_count, 5);
            assert_eq!(summary.total_players, 7);
            assert_eq!(summary.mafia_members, "Eve");
        }
        other => panic!("expected GameOver, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn game_over_without_winner_opens_no_modal() {
    let (mut state, _out) = spectator();
    let updates = state
        .handle_ws_event(
            frame("game_over", json!({"winner": null, "stats": {"day_count": 5}})),
            Instant::now(),
        )
        .await;
    assert!(updates.is_empty());
}

// ===========================================================================
// Snapshot carry-over
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn partial_snapshots_never_zero_held_regions() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    state
        .handle_ws_event(
            frame(
                "game_state",
                json!({
                    "phase": "night", "day_count": 1,
                    "players": {"Alice": {"role": "civilian", "status": "alive"},
                                "Eve": {"role": "mafia", "status": "alive"}},
                    "stats": {"total_alive": 2, "eliminated_count": 0, "alive_mafia": 1, "alive_civilians": 1}
                }),
            ),
            now,
        )
        .await;

    // A snapshot without stats or players only moves the phase.
    let updates = state
        .handle_ws_event(update("game_state", json!({"phase": "day", "day_count": 2})), now)
        .await;
    assert!(updates.iter().all(|u| matches!(
        u,
        UiUpdate::Status(_) | UiUpdate::VotingIndicator(_)
    )));

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.players().len(), 2);
    assert_eq!(snapshot.stats.as_ref().map(|s| s.total_alive), Some(2));
    assert_eq!(snapshot.phase, Some(Phase::Day));
}

#[tokio::test(start_paused = true)]
async fn timeline_never_duplicates_sliding_windows() {
    let (mut state, _out) = spectator();
    let now = Instant::now();
    let event = |i: u32| json!({"type": "vote", "voter": format!("p{i}"), "target": "x",
                                "timestamp": format!("2024-05-01T20:00:{i:02}")});

    let first: Vec<_> = (0..10).map(event).collect();
    let second: Vec<_> = (5..15).map(event).collect();
    state
        .handle_ws_event(frame("game_state", json!({"recent_events": first})), now)
        .await;
    state
        .handle_ws_event(frame("game_state", json!({"recent_events": second})), now)
        .await;

    assert_eq!(state.timeline.recorded(), 15);
    assert_eq!(state.timeline.len(), 10);
}

// ===========================================================================
// Event loop
// ===========================================================================

#[tokio::test]
async fn event_loop_handles_connection_lifecycle() {
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let state = Spectator::new(Config::default(), out_tx);

    let (ws_tx, ws_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let handle = tokio::spawn(app::run(ws_rx, cmd_rx, ui_tx, state));

    ws_tx
        .send(WsEvent::Connected {
            addr: "ws://127.0.0.1:5000/ws".into(),
        })
        .await
        .unwrap();
    let update = recv_until(&mut ui_rx, |u| {
        *u == UiUpdate::ConnectionStatus(ConnectionStatus::Connected)
    })
    .await;
    assert_eq!(update, UiUpdate::ConnectionStatus(ConnectionStatus::Connected));
    assert_eq!(out_rx.recv().await, Some(OutboundCommand::RequestState));

    ws_tx.send(WsEvent::Disconnected).await.unwrap();
    recv_until(&mut ui_rx, |u| {
        *u == UiUpdate::ConnectionStatus(ConnectionStatus::Disconnected)
    })
    .await;

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    let result = handle.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn event_loop_forwards_commands_and_state() {
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let state = Spectator::new(Config::default(), out_tx);

    let (ws_tx, ws_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let handle = tokio::spawn(app::run(ws_rx, cmd_rx, ui_tx, state));

    cmd_tx.send(UserCommand::StartGame).await.unwrap();
    cmd_tx.send(UserCommand::StopGame).await.unwrap();
    assert_eq!(out_rx.recv().await, Some(OutboundCommand::StartGame));
    assert_eq!(out_rx.recv().await, Some(OutboundCommand::StopGame));

    ws_tx
        .send(frame(
            "game_state",
            json!({"players": {"Alice": {"role": "civilian", "status": "alive"}}}),
        ))
        .await
        .unwrap();
    match recv_until(&mut ui_rx, |u| matches!(u, UiUpdate::Roster(_))).await {
        UiUpdate::Roster(rows) => assert_eq!(rows[0].name, "Alice"),
        _ => unreachable!(),
    }

    // Closing the transport channel shuts the loop down.
    drop(ws_tx);
    let result = handle.await.unwrap();
    assert!(result.is_ok());
    drop(cmd_tx);
}
