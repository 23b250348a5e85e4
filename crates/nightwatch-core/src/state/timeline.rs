// Timeline projector: bounded most-recent view over the game event history.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::debug;

use super::parse_timestamp;

/// Number of events the visible timeline holds.
pub const TIMELINE_WINDOW: usize = 10;

/// A game event as reported by the server (`recent_events` entries).
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Elimination { player: String, role: String },
    Investigation { target: String, result: Option<String> },
    Protection { target: String },
    Vote { voter: String, target: String },
    PhaseChange { phase: String },
    GameStart,
    GameEnd { winner: Option<String> },
    /// Unknown tag, or a known tag missing its required fields.
    Other { kind: String, fields: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub kind: EventKind,
    pub timestamp: Option<NaiveDateTime>,
}

impl TimelineEvent {
    /// Build an event from its JSON form. Never fails: anything that does
    /// not fit a known variant becomes `EventKind::Other`.
    pub fn from_value(value: &Value) -> TimelineEvent {
        let timestamp = value
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let s = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        let kind = match tag {
            "elimination" => s("player").map(|player| EventKind::Elimination {
                player,
                role: s("role").unwrap_or_else(|| "unknown".to_string()),
            }),
            "investigation" => s("target").map(|target| EventKind::Investigation {
                target,
                result: s("result"),
            }),
            "protection" => s("target").map(|target| EventKind::Protection { target }),
            "vote" => match (s("voter"), s("target")) {
                (Some(voter), Some(target)) => Some(EventKind::Vote { voter, target }),
                _ => None,
            },
            "phase_change" => s("phase").map(|phase| EventKind::PhaseChange { phase }),
            "game_start" => Some(EventKind::GameStart),
            "game_end" => Some(EventKind::GameEnd {
                winner: s("winner"),
            }),
            _ => None,
        };

        let kind = kind.unwrap_or_else(|| {
            debug!("Timeline event `{}` kept as structured dump", tag);
            EventKind::Other {
                kind: if tag.is_empty() { "event".to_string() } else { tag.to_string() },
                fields: value.clone(),
            }
        });

        TimelineEvent { kind, timestamp }
    }
}

impl EventKind {
    /// Short heading for the event type.
    pub fn title(&self) -> String {
        match self {
            EventKind::Elimination { .. } => "💀 Elimination".to_string(),
            EventKind::Investigation { .. } => "🔍 Investigation".to_string(),
            EventKind::Protection { .. } => "🛡️ Protection".to_string(),
            EventKind::Vote { .. } => "🗳️ Vote".to_string(),
            EventKind::PhaseChange { .. } => "🔄 Phase Change".to_string(),
            EventKind::GameStart => "🎮 Game Start".to_string(),
            EventKind::GameEnd { .. } => "🏁 Game End".to_string(),
            EventKind::Other { kind, .. } => format!("📝 {}", kind),
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        match self {
            EventKind::Elimination { player, role } => {
                format!("{} ({}) was eliminated", player, role)
            }
            EventKind::Investigation { target, result } => match result {
                Some(result) => format!("{} was investigated: {}", target, result),
                None => format!("{} was investigated", target),
            },
            EventKind::Protection { target } => format!("{} was protected", target),
            EventKind::Vote { voter, target } => format!("{} voted for {}", voter, target),
            EventKind::PhaseChange { phase } => format!("Game phase changed to {}", phase),
            EventKind::GameStart => "The game has started".to_string(),
            EventKind::GameEnd { winner } => match winner {
                Some(w) => format!("Game over: {} win", w),
                None => "Game over".to_string(),
            },
            EventKind::Other { fields, .. } => fields.to_string(),
        }
    }
}

/// Keeps the last [`TIMELINE_WINDOW`] events in arrival order. Older
/// history is only counted, not retained.
#[derive(Debug, Default)]
pub struct TimelineProjector {
    window: VecDeque<TimelineEvent>,
    recorded: u64,
}

impl TimelineProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event and slide the window.
    pub fn record(&mut self, event: TimelineEvent) {
        self.window.push_back(event);
        self.recorded += 1;
        while self.window.len() > TIMELINE_WINDOW {
            self.window.pop_front();
        }
    }

    /// Ingest a server window of recent events, recording only the ones not
    /// already held. The longest prefix of `batch` that equals the tail of
    /// the held window is treated as already seen. Returns the number of
    /// events recorded.
    pub fn reconcile(&mut self, batch: &[TimelineEvent]) -> usize {
        let max_overlap = self.window.len().min(batch.len());
        let overlap = (0..=max_overlap)
            .rev()
            .find(|&k| {
                let tail_start = self.window.len() - k;
                self.window
                    .iter()
                    .skip(tail_start)
                    .zip(&batch[..k])
                    .all(|(held, incoming)| held == incoming)
            })
            .unwrap_or(0);

        let fresh = &batch[overlap..];
        for event in fresh {
            self.record(event.clone());
        }
        fresh.len()
    }

    /// Visible events, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &TimelineEvent> {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Total events recorded since the last clear.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.recorded = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
