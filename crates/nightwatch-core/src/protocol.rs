// Message types: the JSON envelope exchanged with the game server, the
// server payload shapes, and the channel messages between the event loop
// and the TUI.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::render::{
    ChatLine, GameSummary, RosterRow, StatsView, StatusView, TimelineEntry, Toast, VoteChart,
    VoteListView,
};
use crate::state::chat::ChatFilter;
use crate::state::votes::VoteEdge;

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// A single WebSocket text frame in either direction:
/// `{"event": "<name>", "data": <payload>}`. `data` may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// Commands the client sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundCommand {
    StartGame,
    StopGame,
    /// Ask the server for a fresh full `game_state` (sent after connecting).
    RequestState,
}

impl OutboundCommand {
    pub fn event_name(self) -> &'static str {
        match self {
            OutboundCommand::StartGame => "start_game",
            OutboundCommand::StopGame => "stop_game",
            OutboundCommand::RequestState => "get_game_state",
        }
    }

    /// Encode as a wire frame. None of the commands carry a payload.
    pub fn to_json(self) -> String {
        let envelope = Envelope {
            event: self.event_name().to_string(),
            data: Value::Null,
        };
        // Serializing a string and a null cannot fail.
        serde_json::to_string(&envelope).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// A decoded inbound server message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `game_update{type, data}` with a recognized update kind.
    Update(GameUpdate),
    GameStarted,
    GameStopped,
    /// Top-level `game_state` carrying a full snapshot.
    GameState(Value),
    GameOver(GameOverPayload),
    Error { message: String },
}

/// The recognized `game_update` kinds with their raw payloads. Payload
/// validation belongs to the component that applies them.
#[derive(Debug, Clone, PartialEq)]
pub enum GameUpdate {
    NewMessage(Value),
    GameState(Value),
    PlayerAction(Value),
    PhaseChange(Value),
}

/// `game_over` payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameOverPayload {
    pub winner: String,
    pub stats: GameStats,
}

impl GameOverPayload {
    /// Read the payload field by field so one bad stat cannot hide the
    /// result. `None` when there is no string `winner` to announce.
    pub fn from_value(value: &Value) -> Option<GameOverPayload> {
        let winner = value.get("winner").and_then(Value::as_str)?;
        let stats = value
            .get("stats")
            .map(GameStats::from_value_lenient)
            .unwrap_or_default();
        Some(GameOverPayload {
            winner: winner.to_string(),
            stats,
        })
    }
}

/// Payload of `error{message}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,
}

/// Payload of `game_update{type: "phase_change"}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseChangePayload {
    #[serde(default)]
    pub phase: String,
}

// ---------------------------------------------------------------------------
// Snapshot payload pieces
// ---------------------------------------------------------------------------

/// Game phase as shown to the spectator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Day,
    Night,
    Voting,
    Ended,
}

impl Phase {
    /// Parse a server phase name. The server's own vocabulary (`setup`,
    /// `first_night`, `game_over`) maps onto the client phases.
    pub fn parse(raw: &str) -> Option<Phase> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lobby" | "setup" => Some(Phase::Lobby),
            "day" => Some(Phase::Day),
            "night" | "first_night" => Some(Phase::Night),
            "voting" => Some(Phase::Voting),
            "ended" | "game_over" => Some(Phase::Ended),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Lobby => "lobby",
            Phase::Day => "day",
            Phase::Night => "night",
            Phase::Voting => "voting",
            Phase::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Civilian,
    Mafia,
    Detective,
    Doctor,
    Narrator,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Civilian => "civilian",
            Role::Mafia => "mafia",
            Role::Detective => "detective",
            Role::Doctor => "doctor",
            Role::Narrator => "narrator",
            Role::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// The server briefly reports protected players as `protected`; they
    /// are alive as far as the spectator is concerned.
    #[default]
    #[serde(alias = "protected")]
    Alive,
    Eliminated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: PlayerStatus,
    #[serde(default)]
    pub votes_received: u32,
}

/// Server-reported aggregate counters (`stats` in a snapshot, and the
/// final statistics in `game_over`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameStats {
    pub phase: Option<String>,
    pub day_count: u32,
    pub total_alive: u32,
    pub alive_mafia: u32,
    pub alive_civilians: u32,
    pub eliminated_count: u32,
    pub mafia_members: Vec<String>,
    /// Target -> number of votes, in server order.
    #[serde(deserialize_with = "ordered_counts")]
    pub vote_counts: Vec<(String, u32)>,
    pub winner: Option<String>,
}

impl GameStats {
    /// Field-by-field read that keeps whatever is well formed. Wrong-typed
    /// fields fall back to their defaults and non-string `mafia_members`
    /// entries are dropped.
    pub fn from_value_lenient(value: &Value) -> GameStats {
        let count = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        let text = |field: &str| value.get(field).and_then(Value::as_str).map(str::to_string);
        let mafia_members = value
            .get("mafia_members")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let vote_counts = value
            .get("vote_counts")
            .and_then(Value::as_object)
            .map(|counts| counts_in_order(counts.clone()))
            .unwrap_or_default();

        GameStats {
            phase: text("phase"),
            day_count: count("day_count"),
            total_alive: count("total_alive"),
            alive_mafia: count("alive_mafia"),
            alive_civilians: count("alive_civilians"),
            eliminated_count: count("eliminated_count"),
            mafia_members,
            vote_counts,
            winner: text("winner"),
        }
    }
}

/// `game_update{type: "new_message"}` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chat_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Deserialize a JSON object of counts into an ordered list, skipping
/// entries whose value is not a non-negative integer.
fn ordered_counts<'de, D>(deserializer: D) -> Result<Vec<(String, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Option::<serde_json::Map<String, Value>>::deserialize(deserializer)?;
    Ok(counts_in_order(map.unwrap_or_default()))
}

fn counts_in_order(map: serde_json::Map<String, Value>) -> Vec<(String, u32)> {
    map.into_iter()
        .filter_map(|(name, count)| {
            count
                .as_u64()
                .and_then(|c| u32::try_from(c).ok())
                .map(|c| (name, c))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Event loop <-> TUI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Intents sent from the TUI to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    StartGame,
    StopGame,
    /// Select a chat filter by tag (`all`, `public`, `mafia`, `narrator`).
    SetFilter(String),
    Quit,
}

/// View-region updates pushed from the event loop to the TUI. Each variant
/// targets exactly one region; regions not mentioned keep their contents.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    ConnectionStatus(ConnectionStatus),
    Status(StatusView),
    Roster(Vec<RosterRow>),
    VoteChart(VoteChart),
    VoteList(VoteListView),
    /// The 2 s "new vote" highlight for this edge ran out.
    VoteHighlightCleared(VoteEdge),
    /// "Waiting for votes" banner: day phase with an empty vote map.
    VotingIndicator(bool),
    Stats(StatsView),
    Timeline(Vec<TimelineEntry>),
    /// A message was appended to the log; `visible` says whether the
    /// active filter shows it. `total` is the log length after the append.
    ChatAppended {
        line: ChatLine,
        visible: bool,
        total: usize,
    },
    /// The visible chat was recomputed for `filter`.
    ChatReplaced {
        filter: ChatFilter,
        lines: Vec<ChatLine>,
        total: usize,
    },
    /// The chat log was cleared for a new game.
    ChatCleared,
    Toast(Toast),
    ToastExpired(u64),
    StartAffordance { enabled: bool },
    GameOver(Box<GameSummary>),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
