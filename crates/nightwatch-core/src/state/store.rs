// State store: the single authoritative game snapshot and the diff produced
// by each full-state apply.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::timeline::TimelineEvent;
use super::votes::VoteEdge;
use crate::protocol::{GameStats, Phase, PlayerInfo, Role};

/// The game as of the last applied update. Regions the server has never
/// reported are `None`; that is distinct from "reported empty".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    pub phase: Option<Phase>,
    pub day_count: Option<u32>,
    /// Player name -> info, in server order. Names are unique.
    pub players: Option<Vec<(String, PlayerInfo)>>,
    /// One live vote per voter, in server order.
    pub votes: Option<Vec<VoteEdge>>,
    pub stats: Option<GameStats>,
    pub recent_events: Option<Vec<TimelineEvent>>,
}

impl GameSnapshot {
    pub fn players(&self) -> &[(String, PlayerInfo)] {
        self.players.as_deref().unwrap_or_default()
    }

    pub fn votes(&self) -> &[VoteEdge] {
        self.votes.as_deref().unwrap_or_default()
    }

    pub fn recent_events(&self) -> &[TimelineEvent] {
        self.recent_events.as_deref().unwrap_or_default()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerInfo> {
        self.players()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, info)| info)
    }
}

/// Which view regions differ between the previous and the new snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateDiff {
    /// Phase, day, alive/eliminated counters.
    pub status: bool,
    pub roster: bool,
    pub votes: bool,
    pub stats: bool,
    pub timeline: bool,
    /// The snapshot carried a vote map, changed or not. Re-reporting the
    /// same votes still settles their new/unchanged annotation.
    pub votes_reported: bool,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        !(self.status || self.roster || self.votes || self.stats || self.timeline)
    }
}

/// The regions present in one inbound snapshot. Absent or malformed
/// regions are `None` and leave the held value untouched.
#[derive(Debug, Default)]
pub struct SnapshotPayload {
    pub phase: Option<Phase>,
    pub day_count: Option<u32>,
    pub players: Option<Vec<(String, PlayerInfo)>>,
    pub votes: Option<Vec<VoteEdge>>,
    pub stats: Option<GameStats>,
    pub recent_events: Option<Vec<TimelineEvent>>,
}

impl SnapshotPayload {
    /// Extract every recognizable region from a raw snapshot. Never fails.
    pub fn from_value(value: &Value) -> SnapshotPayload {
        let Some(obj) = value.as_object() else {
            warn!("Ignoring non-object game state");
            return SnapshotPayload::default();
        };

        let stats = obj.get("stats").and_then(|v| match v {
            Value::Null => None,
            v => serde_json::from_value::<GameStats>(v.clone())
                .map_err(|e| warn!("Ignoring malformed stats: {}", e))
                .ok(),
        });

        // Older servers only report phase/day inside stats.
        let phase_raw = obj
            .get("phase")
            .and_then(Value::as_str)
            .or_else(|| stats.as_ref().and_then(|s| s.phase.as_deref()));
        let phase = phase_raw.and_then(|raw| {
            let parsed = Phase::parse(raw);
            if parsed.is_none() {
                warn!("Ignoring unknown phase `{}`", raw);
            }
            parsed
        });

        let day_count = obj
            .get("day_count")
            .and_then(Value::as_u64)
            .and_then(|d| u32::try_from(d).ok())
            .or_else(|| {
                obj.get("stats")
                    .and_then(|s| s.get("day_count"))
                    .and_then(Value::as_u64)
                    .and_then(|d| u32::try_from(d).ok())
            });

        SnapshotPayload {
            phase,
            day_count,
            players: obj.get("players").and_then(parse_players),
            votes: obj.get("votes").and_then(parse_votes),
            stats,
            recent_events: obj.get("recent_events").and_then(parse_events),
        }
    }
}

fn object_region<'a>(value: &'a Value, region: &str) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            warn!("Ignoring malformed {} region: expected object, got {}", region, other);
            None
        }
    }
}

fn parse_players(value: &Value) -> Option<Vec<(String, PlayerInfo)>> {
    let map = object_region(value, "players")?;
    Some(
        map.iter()
            .filter_map(|(name, info)| {
                match serde_json::from_value::<PlayerInfo>(info.clone()) {
                    Ok(info) => Some((name.clone(), info)),
                    Err(e) => {
                        warn!("Skipping malformed player entry `{}`: {}", name, e);
                        None
                    }
                }
            })
            .collect(),
    )
}

fn parse_votes(value: &Value) -> Option<Vec<VoteEdge>> {
    let map = object_region(value, "votes")?;
    Some(
        map.iter()
            .filter_map(|(voter, target)| match target.as_str() {
                Some(target) => Some(VoteEdge::new(voter.as_str(), target)),
                None => {
                    warn!("Skipping vote from `{}` with non-string target", voter);
                    None
                }
            })
            .collect(),
    )
}

fn parse_events(value: &Value) -> Option<Vec<TimelineEvent>> {
    match value {
        Value::Array(items) => Some(items.iter().map(TimelineEvent::from_value).collect()),
        Value::Null => None,
        other => {
            warn!("Ignoring malformed recent_events: expected array, got {}", other);
            None
        }
    }
}

/// Alive/eliminated counters shown in the status panel.
fn status_counts(stats: Option<&GameStats>) -> Option<(u32, u32)> {
    stats.map(|s| (s.total_alive, s.eliminated_count))
}

/// Owns the snapshot and replaces it whole on every apply, so readers see
/// either the previous or the new snapshot and never a mix.
#[derive(Debug, Default)]
pub struct StateStore {
    snapshot: GameSnapshot,
    applied: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    /// Number of full-state applies so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Apply a raw full-state message and report which regions changed.
    pub fn apply_full_state(&mut self, value: &Value) -> StateDiff {
        self.apply_payload(SnapshotPayload::from_value(value))
    }

    /// Apply an already extracted snapshot. Regions missing from `incoming`
    /// carry over from the held snapshot.
    pub fn apply_payload(&mut self, incoming: SnapshotPayload) -> StateDiff {
        let votes_reported = incoming.votes.is_some();
        let prev = &self.snapshot;
        let next = GameSnapshot {
            phase: incoming.phase.or(prev.phase),
            day_count: incoming.day_count.or(prev.day_count),
            players: incoming.players.or_else(|| prev.players.clone()),
            votes: incoming.votes.or_else(|| prev.votes.clone()),
            stats: incoming.stats.or_else(|| prev.stats.clone()),
            recent_events: incoming.recent_events.or_else(|| prev.recent_events.clone()),
        };

        let diff = StateDiff {
            status: next.phase != prev.phase
                || next.day_count != prev.day_count
                || status_counts(next.stats.as_ref()) != status_counts(prev.stats.as_ref()),
            roster: next.players != prev.players,
            votes: next.votes != prev.votes,
            stats: next.stats != prev.stats,
            timeline: next.recent_events != prev.recent_events,
            votes_reported,
        };

        self.snapshot = next;
        self.applied += 1;
        debug!("Applied full state #{}: {:?}", self.applied, diff);
        diff
    }

    /// Role of `name`, or `Role::Unknown` if the player is not (yet) known.
    pub fn current_role_of(&self, name: &str) -> Role {
        self.snapshot
            .player(name)
            .map(|info| info.role)
            .unwrap_or(Role::Unknown)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlayerStatus;
    use serde_json::json;

    fn full_snapshot() -> Value {
        json!({
            "phase": "day",
            "day_count": 2,
            "players": {
                "Alice": {"role": "civilian", "status": "alive", "votes_received": 0},
                "Bob": {"role": "mafia", "status": "alive", "votes_received": 1},
                "Narrator": {"role": "narrator", "status": "alive", "votes_received": 0}
            },
            "votes": {"Alice": "Bob"},
            "stats": {"total_alive": 3, "eliminated_count": 1, "alive_mafia": 1, "alive_civilians": 2,
                      "vote_counts": {"Bob": 1}, "mafia_members": ["Bob"]},
            "recent_events": [{"type": "phase_change", "phase": "day", "timestamp": "2024-05-01T20:00:00"}]
        })
    }

    #[test]
    fn first_apply_marks_all_present_regions() {
        let mut store = StateStore::new();
        let diff = store.apply_full_state(&full_snapshot());
        assert_eq!(
            diff,
            StateDiff {
                status: true,
                roster: true,
                votes: true,
                stats: true,
                timeline: true,
                votes_reported: true,
            }
        );
        assert_eq!(store.snapshot().phase, Some(Phase::Day));
        assert_eq!(store.snapshot().day_count, Some(2));
        assert_eq!(store.snapshot().players().len(), 3);
        assert_eq!(store.snapshot().votes(), &[VoteEdge::new("Alice", "Bob")]);
    }

    #[test]
    fn identical_apply_reports_no_change() {
        let mut store = StateStore::new();
        store.apply_full_state(&full_snapshot());
        let diff = store.apply_full_state(&full_snapshot());
        assert!(diff.is_empty());
        assert!(diff.votes_reported);
        assert_eq!(store.applied(), 2);
    }

    #[test]
    fn omitted_regions_carry_over() {
        let mut store = StateStore::new();
        store.apply_full_state(&full_snapshot());
        let before = store.snapshot().clone();

        let diff = store.apply_full_state(&json!({"phase": "night"}));
        assert!(diff.status);
        assert!(!diff.roster && !diff.votes && !diff.stats && !diff.timeline);
        assert!(!diff.votes_reported);

        let after = store.snapshot();
        assert_eq!(after.phase, Some(Phase::Night));
        assert_eq!(after.players, before.players);
        assert_eq!(after.votes, before.votes);
        assert_eq!(after.stats, before.stats);
        assert_eq!(after.recent_events, before.recent_events);
        assert_eq!(after.day_count, Some(2));
    }

    #[test]
    fn snapshot_after_many_applies_is_last_with_carry_over() {
        let mut store = StateStore::new();
        store.apply_full_state(&full_snapshot());
        store.apply_full_state(&json!({"votes": {}}));
        store.apply_full_state(&json!({"day_count": 3, "votes": {"Bob": "Alice"}}));

        let snap = store.snapshot();
        assert_eq!(snap.day_count, Some(3));
        assert_eq!(snap.votes(), &[VoteEdge::new("Bob", "Alice")]);
        assert_eq!(snap.players().len(), 3);
        assert_eq!(snap.stats.as_ref().unwrap().total_alive, 3);
    }

    #[test]
    fn no_active_game_message_changes_nothing() {
        let mut store = StateStore::new();
        store.apply_full_state(&full_snapshot());
        let diff = store.apply_full_state(&json!({"message": "No active game"}));
        assert!(diff.is_empty());
    }

    #[test]
    fn empty_votes_differs_from_never_reported() {
        let mut store = StateStore::new();
        let diff = store.apply_full_state(&json!({"phase": "day", "votes": {}}));
        assert!(diff.votes);
        assert_eq!(store.snapshot().votes, Some(vec![]));
    }

    #[test]
    fn malformed_regions_are_ignored() {
        let mut store = StateStore::new();
        store.apply_full_state(&full_snapshot());
        let diff = store.apply_full_state(&json!({
            "players": 42,
            "votes": ["nope"],
            "stats": {"total_alive": "many"},
            "recent_events": "none",
            "phase": "intermission"
        }));
        assert!(diff.is_empty());
        assert_eq!(store.snapshot().players().len(), 3);
    }

    #[test]
    fn malformed_player_entry_is_skipped() {
        let mut store = StateStore::new();
        store.apply_full_state(&json!({
            "players": {
                "Alice": {"role": "civilian", "status": "alive"},
                "Ghost": "boo"
            }
        }));
        assert_eq!(store.snapshot().players().len(), 1);
        assert_eq!(
            store.snapshot().player("Alice").unwrap().status,
            PlayerStatus::Alive
        );
    }

    #[test]
    fn non_object_state_is_ignored() {
        let mut store = StateStore::new();
        assert!(store.apply_full_state(&json!([1, 2, 3])).is_empty());
        assert!(store.apply_full_state(&Value::Null).is_empty());
    }

    #[test]
    fn phase_falls_back_to_stats() {
        let mut store = StateStore::new();
        store.apply_full_state(&json!({"stats": {"phase": "night", "day_count": 4}}));
        assert_eq!(store.snapshot().phase, Some(Phase::Night));
        assert_eq!(store.snapshot().day_count, Some(4));
    }

    #[test]
    fn current_role_of_unknowns() {
        let mut store = StateStore::new();
        assert_eq!(store.current_role_of("Alice"), Role::Unknown);
        store.apply_full_state(&full_snapshot());
        assert_eq!(store.current_role_of("Bob"), Role::Mafia);
        assert_eq!(store.current_role_of("Zed"), Role::Unknown);
    }

    #[test]
    fn vote_order_is_server_order() {
        let mut store = StateStore::new();
        store.apply_full_state(&json!({"votes": {"Zed": "Amy", "Amy": "Zed", "Mia": "Zed"}}));
        let voters: Vec<_> = store.snapshot().votes().iter().map(|v| v.voter.as_str()).collect();
        assert_eq!(voters, vec!["Zed", "Amy", "Mia"]);
    }
}
