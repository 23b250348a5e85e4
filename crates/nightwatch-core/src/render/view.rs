// View-model types pushed to the TUI, and the pure functions that build
// them from state.

use chrono::NaiveDateTime;

use super::format::{format_content, Fragment};
use crate::protocol::{GameOverPayload, GameStats, Phase, PlayerStatus, Role};
use crate::state::chat::{Channel, ChatMessage, NARRATOR};
use crate::state::store::GameSnapshot;
use crate::state::timeline::TimelineEvent;
use crate::state::votes::{VoteAnnotations, VoteEdge};

/// Clock format for chat and timeline entries.
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub fn clock(ts: &NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Status and roster
// ---------------------------------------------------------------------------

/// Status panel counters. `None` means the server has not reported it yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusView {
    pub phase: Option<Phase>,
    pub day_count: Option<u32>,
    pub alive: Option<u32>,
    pub eliminated: Option<u32>,
}

impl StatusView {
    pub fn from_snapshot(snapshot: &GameSnapshot) -> StatusView {
        StatusView {
            phase: snapshot.phase,
            day_count: snapshot.day_count,
            alive: snapshot.stats.as_ref().map(|s| s.total_alive),
            eliminated: snapshot.stats.as_ref().map(|s| s.eliminated_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub role: Role,
    pub status: PlayerStatus,
    pub votes_received: u32,
}

/// Roster rows in server order. The narrator is not a player and is hidden.
pub fn roster_rows(snapshot: &GameSnapshot) -> Vec<RosterRow> {
    snapshot
        .players()
        .iter()
        .filter(|(name, _)| name != NARRATOR)
        .map(|(name, info)| RosterRow {
            name: name.clone(),
            role: info.role,
            status: info.status,
            votes_received: info.votes_received,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

/// Input for the bar chart sink: parallel labels and values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteChart {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl VoteChart {
    pub fn from_stats(stats: Option<&GameStats>) -> VoteChart {
        let counts = stats.map(|s| s.vote_counts.as_slice()).unwrap_or_default();
        VoteChart {
            labels: counts.iter().map(|(name, _)| name.clone()).collect(),
            values: counts.iter().map(|(_, n)| u64::from(*n)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRow {
    pub edge: VoteEdge,
    /// Shown with the "new vote" highlight until it is cleared.
    pub highlighted: bool,
}

impl VoteRow {
    pub fn label(&self) -> String {
        format!("{} -> {}", self.edge.voter, self.edge.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteListView {
    NoVotes,
    Entries(Vec<VoteRow>),
}

impl VoteListView {
    pub const PLACEHOLDER: &'static str = "No votes cast yet";

    pub fn from_annotations(annotations: VoteAnnotations) -> VoteListView {
        match annotations {
            VoteAnnotations::NoVotes => VoteListView::NoVotes,
            VoteAnnotations::Entries(entries) => VoteListView::Entries(
                entries
                    .into_iter()
                    .map(|v| VoteRow {
                        edge: v.edge,
                        highlighted: v.fresh,
                    })
                    .collect(),
            ),
        }
    }
}

/// The "waiting for votes" banner shows during the day before anyone votes.
pub fn voting_indicator(snapshot: &GameSnapshot) -> bool {
    snapshot.phase == Some(Phase::Day) && snapshot.votes().is_empty()
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsView {
    pub alive_mafia: u32,
    pub alive_civilians: u32,
    /// Percent of all players eliminated so far, 0..=100.
    pub elimination_rate: u32,
}

impl StatsView {
    pub fn from_stats(stats: &GameStats) -> StatsView {
        StatsView {
            alive_mafia: stats.alive_mafia,
            alive_civilians: stats.alive_civilians,
            elimination_rate: elimination_rate(stats.total_alive, stats.eliminated_count),
        }
    }
}

/// `round(eliminated / (alive + eliminated) * 100)`, halves rounding up.
/// Zero when nobody has been counted yet.
pub fn elimination_rate(alive: u32, eliminated: u32) -> u32 {
    let total = u64::from(alive) + u64::from(eliminated);
    if total == 0 {
        return 0;
    }
    let rate = (u64::from(eliminated) * 200 + total) / (total * 2);
    rate as u32
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub title: String,
    pub description: String,
    pub time: Option<String>,
}

impl TimelineEntry {
    pub fn from_event(event: &TimelineEvent) -> TimelineEntry {
        TimelineEntry {
            title: event.kind.title(),
            description: event.kind.describe(),
            time: event.timestamp.as_ref().map(clock),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub seq: u64,
    pub sender: String,
    /// Sender's role as of rendering, for styling.
    pub sender_role: Role,
    pub channel: Channel,
    pub fragments: Vec<Fragment>,
    pub time: String,
}

impl ChatLine {
    pub fn new(message: &ChatMessage, sender_role: Role) -> ChatLine {
        ChatLine {
            seq: message.seq,
            sender: message.sender.clone(),
            sender_role,
            channel: message.channel.clone(),
            fragments: format_content(&message.content),
            time: clock(&message.timestamp),
        }
    }

    /// Channel badge shown after the sender name.
    pub fn marker(&self) -> Option<&'static str> {
        match self.channel {
            Channel::Mafia => Some("🔴"),
            Channel::Private => Some("🔒"),
            Channel::Public | Channel::Other(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Game over
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Mafia,
    Civilians,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub winner: Winner,
    pub announcement: String,
    pub day_count: u32,
    pub total_players: u32,
    pub survivors: u32,
    pub eliminated: u32,
    pub mafia_members: String,
}

impl GameSummary {
    pub fn from_payload(payload: &GameOverPayload) -> GameSummary {
        let winner = if payload.winner.eq_ignore_ascii_case("mafia") {
            Winner::Mafia
        } else {
            Winner::Civilians
        };
        let announcement = match winner {
            Winner::Mafia => "MAFIA VICTORY!",
            Winner::Civilians => "CIVILIAN VICTORY!",
        };
        let stats = &payload.stats;
        GameSummary {
            winner,
            announcement: announcement.to_string(),
            day_count: stats.day_count,
            total_players: stats.total_alive.saturating_add(stats.eliminated_count),
            survivors: stats.total_alive,
            eliminated: stats.eliminated_count,
            mafia_members: stats.mafia_members.join(", "),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
