// Inbound message decoding: raw WebSocket text -> ServerEvent.
//
// Only dispatch happens here. Payload contents are handed through as JSON
// values and validated by whichever component applies them.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::{Envelope, ErrorPayload, GameOverPayload, GameUpdate, ServerEvent};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unrecognized event `{0}`")]
    UnknownEvent(String),

    #[error("unrecognized game_update type `{0}`")]
    UnknownUpdateKind(String),

    #[error("game_over without a readable winner")]
    MissingWinner,
}

/// The closed set of `game_update` kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    NewMessage,
    GameState,
    PlayerAction,
    PhaseChange,
    Unrecognized,
}

impl UpdateKind {
    pub fn classify(kind: &str) -> UpdateKind {
        match kind {
            "new_message" => UpdateKind::NewMessage,
            "game_state" => UpdateKind::GameState,
            "player_action" => UpdateKind::PlayerAction,
            "phase_change" => UpdateKind::PhaseChange,
            _ => UpdateKind::Unrecognized,
        }
    }
}

/// Decode one raw text frame.
///
/// Errors are never fatal: the caller logs them and moves on to the next
/// message.
pub fn decode(raw: &str) -> Result<ServerEvent, DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    decode_envelope(envelope)
}

pub fn decode_envelope(envelope: Envelope) -> Result<ServerEvent, DecodeError> {
    let Envelope { event, data } = envelope;
    match event.as_str() {
        "game_update" => decode_game_update(data),
        "game_started" => Ok(ServerEvent::GameStarted),
        "game_stopped" => Ok(ServerEvent::GameStopped),
        "game_state" => Ok(ServerEvent::GameState(data)),
        "game_over" => game_over(&data),
        "error" => {
            let payload: ErrorPayload = serde_json::from_value(data).unwrap_or_default();
            Ok(ServerEvent::Error {
                message: payload.message,
            })
        }
        _ => Err(DecodeError::UnknownEvent(event)),
    }
}

/// Split a `game_update{type, data}` payload into its kind.
fn decode_game_update(payload: Value) -> Result<ServerEvent, DecodeError> {
    let (kind, data) = match payload {
        Value::Object(mut map) => {
            let kind = match map.remove("type") {
                Some(Value::String(s)) => s,
                _ => String::new(),
            };
            let data = map.remove("data").unwrap_or(Value::Null);
            (kind, data)
        }
        _ => (String::new(), Value::Null),
    };

    let update = match UpdateKind::classify(&kind) {
        UpdateKind::NewMessage => GameUpdate::NewMessage(data),
        UpdateKind::GameState => GameUpdate::GameState(data),
        UpdateKind::PlayerAction => GameUpdate::PlayerAction(data),
        UpdateKind::PhaseChange => GameUpdate::PhaseChange(data),
        // The server announces the end of the game through the update
        // channel as well as the top-level event.
        UpdateKind::Unrecognized if kind == "game_over" => {
            return game_over(&data);
        }
        UpdateKind::Unrecognized => return Err(DecodeError::UnknownUpdateKind(kind)),
    };
    Ok(ServerEvent::Update(update))
}

fn game_over(data: &Value) -> Result<ServerEvent, DecodeError> {
    GameOverPayload::from_value(data)
        .map(ServerEvent::GameOver)
        .ok_or(DecodeError::MissingWinner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
