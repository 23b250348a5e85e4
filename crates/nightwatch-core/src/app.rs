// Spectator state and the central event loop.
//
// Transport events, user commands and the timer tick all funnel into one
// `tokio::select!` loop that owns every piece of client state. Handlers
// return the view updates they produce; the loop forwards them to the TUI.

use std::time::Duration;

use chrono::Local;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::commands::CommandEmitter;
use crate::config::Config;
use crate::decoder;
use crate::protocol::{
    ChatPayload, ConnectionStatus, GameOverPayload, GameUpdate, OutboundCommand,
    PhaseChangePayload, ServerEvent, UiUpdate, UserCommand,
};
use crate::render::{ChatLine, GameSummary, RenderCoordinator, Toast, ToastLevel};
use crate::state::chat::{ChatFilter, ChatLog, ChatMessage};
use crate::state::store::StateStore;
use crate::state::timeline::TimelineProjector;
use crate::timers::Deadlines;
use crate::ws_client::WsEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How often the loop polls the timer tables.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Spectator
// ---------------------------------------------------------------------------

/// All client-side state. Built explicitly with its outbound channel so
/// tests can run isolated instances.
pub struct Spectator {
    pub config: Config,
    pub store: StateStore,
    pub coordinator: RenderCoordinator,
    pub chat: ChatLog,
    pub timeline: TimelineProjector,
    pub commands: CommandEmitter,
    pub connection_status: ConnectionStatus,
    toasts: Deadlines<u64>,
    next_toast_id: u64,
    /// The start affordance is greyed out until the cooldown runs out.
    start_disabled: bool,
}

impl Spectator {
    pub fn new(config: Config, out_tx: mpsc::Sender<OutboundCommand>) -> Self {
        let filter = config.ui.chat_filter();
        Spectator {
            config,
            store: StateStore::new(),
            coordinator: RenderCoordinator::new(),
            chat: ChatLog::new(),
            timeline: TimelineProjector::new(),
            commands: CommandEmitter::new(out_tx, filter),
            connection_status: ConnectionStatus::Disconnected,
            toasts: Deadlines::new(),
            next_toast_id: 0,
            start_disabled: false,
        }
    }

    /// Updates that bring a fresh TUI in line with the current state.
    pub fn initial_view(&self) -> Vec<UiUpdate> {
        vec![
            UiUpdate::ConnectionStatus(self.connection_status),
            UiUpdate::StartAffordance {
                enabled: !self.start_disabled,
            },
            self.chat_view(),
        ]
    }

    // -- transport ----------------------------------------------------------

    pub async fn handle_ws_event(&mut self, event: WsEvent, now: Instant) -> Vec<UiUpdate> {
        match event {
            WsEvent::Connected { addr } => {
                info!("Connected to game server at {}", addr);
                self.connection_status = ConnectionStatus::Connected;
                if self.config.server.resync_on_connect {
                    self.commands.request_state().await;
                }
                vec![UiUpdate::ConnectionStatus(ConnectionStatus::Connected)]
            }
            WsEvent::Disconnected => {
                info!("Disconnected from game server");
                self.connection_status = ConnectionStatus::Disconnected;
                let mut updates = vec![UiUpdate::ConnectionStatus(ConnectionStatus::Disconnected)];
                updates.extend(self.cancel_start_cooldown());
                updates
            }
            WsEvent::Message(raw) => match decoder::decode(&raw) {
                Ok(event) => self.handle_server_event(event, now),
                Err(e) => {
                    warn!("Dropping server message: {}", e);
                    Vec::new()
                }
            },
        }
    }

    // -- server events ------------------------------------------------------

    pub fn handle_server_event(&mut self, event: ServerEvent, now: Instant) -> Vec<UiUpdate> {
        match event {
            ServerEvent::Update(GameUpdate::NewMessage(data)) => self.append_chat(data),
            ServerEvent::Update(GameUpdate::GameState(data)) | ServerEvent::GameState(data) => {
                self.apply_full_state(&data, now)
            }
            ServerEvent::Update(GameUpdate::PlayerAction(data)) => {
                debug!("Player action: {}", data);
                Vec::new()
            }
            ServerEvent::Update(GameUpdate::PhaseChange(data)) => {
                let payload: PhaseChangePayload = serde_json::from_value(data).unwrap_or_default();
                info!("Phase change announced: {}", payload.phase);
                vec![self.toast(
                    ToastLevel::Info,
                    format!("Phase changed to: {}", payload.phase),
                    now,
                )]
            }
            ServerEvent::GameStarted => {
                info!("Game started");
                self.chat.clear();
                self.timeline.clear();
                self.coordinator.reset_round();
                vec![
                    self.toast(ToastLevel::Success, "Game starting...".into(), now),
                    UiUpdate::ChatCleared,
                    UiUpdate::Timeline(Vec::new()),
                ]
            }
            ServerEvent::GameStopped => {
                info!("Game stopped");
                let mut updates = vec![self.toast(ToastLevel::Info, "Game stopped".into(), now)];
                updates.extend(self.cancel_start_cooldown());
                updates
            }
            ServerEvent::GameOver(payload) => self.game_over(&payload),
            ServerEvent::Error { message } => {
                warn!("Server error: {}", message);
                vec![self.toast(ToastLevel::Error, message, now)]
            }
        }
    }

    fn apply_full_state(&mut self, data: &Value, now: Instant) -> Vec<UiUpdate> {
        let diff = self.store.apply_full_state(data);
        if diff.timeline {
            let added = self.timeline.reconcile(self.store.snapshot().recent_events());
            debug!("Timeline gained {} events", added);
        }
        self.coordinator
            .plan(&diff, self.store.snapshot(), &self.timeline, now)
    }

    fn append_chat(&mut self, data: Value) -> Vec<UiUpdate> {
        let payload: ChatPayload = match serde_json::from_value(data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping malformed chat message: {}", e);
                return Vec::new();
            }
        };
        let message = ChatMessage::from_payload(payload, Local::now().naive_local());

        // Append first; visibility is decided against the stored entry.
        let stored = self.chat.append(message);
        let filter = self.commands.filter();
        let line = ChatLine::new(stored, self.store.current_role_of(&stored.sender));
        let visible = filter.matches(stored);
        vec![UiUpdate::ChatAppended {
            line,
            visible,
            total: self.chat.len(),
        }]
    }

    fn game_over(&mut self, payload: &GameOverPayload) -> Vec<UiUpdate> {
        info!("Game over, winner: {}", payload.winner);
        vec![UiUpdate::GameOver(Box::new(GameSummary::from_payload(payload)))]
    }

    // -- user commands ------------------------------------------------------

    pub async fn handle_user_command(&mut self, cmd: UserCommand, now: Instant) -> Vec<UiUpdate> {
        match cmd {
            UserCommand::StartGame => {
                if self.commands.request_start(now).await {
                    self.start_disabled = true;
                    vec![UiUpdate::StartAffordance { enabled: false }]
                } else {
                    Vec::new()
                }
            }
            UserCommand::StopGame => {
                self.commands.request_stop().await;
                Vec::new()
            }
            UserCommand::SetFilter(tag) => match self.commands.set_filter(&tag) {
                Some(_) => vec![self.chat_view()],
                None => Vec::new(),
            },
            UserCommand::Quit => Vec::new(),
        }
    }

    // -- timers -------------------------------------------------------------

    /// Fire every cosmetic timer that is due.
    pub fn tick(&mut self, now: Instant) -> Vec<UiUpdate> {
        let mut updates = self.coordinator.expire(now);
        updates.extend(
            self.toasts
                .take_expired(now)
                .into_iter()
                .map(UiUpdate::ToastExpired),
        );
        if self.start_disabled && !self.commands.start_cooling_down(now) {
            self.start_disabled = false;
            updates.push(UiUpdate::StartAffordance { enabled: true });
        }
        updates
    }

    // -- helpers ------------------------------------------------------------

    /// The chat as the active filter shows it.
    pub fn chat_view(&self) -> UiUpdate {
        let filter: ChatFilter = self.commands.filter();
        let lines = self
            .chat
            .filtered_view(filter)
            .map(|m| ChatLine::new(m, self.store.current_role_of(&m.sender)))
            .collect();
        UiUpdate::ChatReplaced {
            filter,
            lines,
            total: self.chat.len(),
        }
    }

    fn toast(&mut self, level: ToastLevel, text: String, now: Instant) -> UiUpdate {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toasts.set(id, now, TOAST_TTL);
        UiUpdate::Toast(Toast { id, level, text })
    }

    fn cancel_start_cooldown(&mut self) -> Option<UiUpdate> {
        self.commands.reset_cooldown();
        if self.start_disabled {
            self.start_disabled = false;
            Some(UiUpdate::StartAffordance { enabled: true })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the spectator event loop until the transport or the TUI hangs up.
///
/// Listens on two channels plus a timer tick using `tokio::select!`:
/// - `ws_rx`: connection lifecycle and raw server frames
/// - `cmd_rx`: user intents from the TUI
pub async fn run(
    mut ws_rx: mpsc::Receiver<WsEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: Spectator,
) -> anyhow::Result<()> {
    info!("Spectator event loop started");

    send_all(&ui_tx, state.initial_view()).await;

    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // --- Transport events ---
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(event) => {
                        let updates = state.handle_ws_event(event, Instant::now()).await;
                        send_all(&ui_tx, updates).await;
                    }
                    None => {
                        info!("WebSocket channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        let updates = state.handle_user_command(cmd, Instant::now()).await;
                        send_all(&ui_tx, updates).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Cosmetic timers and start cooldown ---
            _ = tick.tick() => {
                let updates = state.tick(Instant::now());
                send_all(&ui_tx, updates).await;
            }
        }
    }

    info!("Spectator event loop exiting");
    Ok(())
}

async fn send_all(ui_tx: &mpsc::Sender<UiUpdate>, updates: Vec<UiUpdate>) {
    for update in updates {
        if ui_tx.send(update).await.is_err() {
            debug!("UI channel closed, dropping update");
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
