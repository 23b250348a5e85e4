// Render coordinator: turns state diffs into the minimal set of view-region
// updates for the TUI.

pub mod format;
pub mod view;

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::protocol::UiUpdate;
use crate::state::store::{GameSnapshot, StateDiff};
use crate::state::timeline::TimelineProjector;
use crate::state::votes::{VoteAnnotations, VoteEdge, VoteReconciler};
use crate::timers::Deadlines;

pub use format::{Emphasis, Fragment};
pub use view::{
    elimination_rate, ChatLine, GameSummary, RosterRow, StatsView, StatusView, TimelineEntry,
    Toast, ToastLevel, VoteChart, VoteListView, VoteRow, Winner,
};

/// How long a newly cast vote stays highlighted.
pub const VOTE_HIGHLIGHT: Duration = Duration::from_secs(2);

/// Maps each [`StateDiff`] to updates for the regions it touches. Owns the
/// vote reconciler (the list's new/unchanged annotation) and the highlight
/// deadlines that follow from it.
#[derive(Debug, Default)]
pub struct RenderCoordinator {
    votes: VoteReconciler,
    highlights: Deadlines<VoteEdge>,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates for every region `diff` marks as changed, in a fixed region
    /// order. An empty diff yields nothing.
    pub fn plan(
        &mut self,
        diff: &StateDiff,
        snapshot: &GameSnapshot,
        timeline: &TimelineProjector,
        now: Instant,
    ) -> Vec<UiUpdate> {
        let mut updates = Vec::new();

        if diff.status {
            updates.push(UiUpdate::Status(StatusView::from_snapshot(snapshot)));
        }
        if diff.roster {
            updates.push(UiUpdate::Roster(view::roster_rows(snapshot)));
        }
        if diff.stats {
            updates.push(UiUpdate::VoteChart(VoteChart::from_stats(
                snapshot.stats.as_ref(),
            )));
            if let Some(stats) = &snapshot.stats {
                updates.push(UiUpdate::Stats(StatsView::from_stats(stats)));
            }
        }
        if diff.votes {
            updates.push(UiUpdate::VoteList(self.vote_list(snapshot.votes(), now)));
        } else if diff.votes_reported {
            updates.extend(self.settle_votes(snapshot.votes(), now));
        }
        if diff.status || diff.votes {
            updates.push(UiUpdate::VotingIndicator(view::voting_indicator(snapshot)));
        }
        if diff.timeline {
            updates.push(UiUpdate::Timeline(
                timeline.visible().map(TimelineEntry::from_event).collect(),
            ));
        }

        debug!("Planned {} view updates for {:?}", updates.len(), diff);
        updates
    }

    /// Reconcile `votes` against the current round and arm the highlight
    /// timer for every newly seen edge.
    pub fn vote_list(&mut self, votes: &[VoteEdge], now: Instant) -> VoteListView {
        let annotations = self.votes.reconcile(votes);
        self.arm_highlights(VoteListView::from_annotations(annotations), now)
    }

    /// Re-reconcile a vote map identical to the one already shown. Edges
    /// still highlighted are no longer new and drop their highlight now. If
    /// the round was reset underneath, the edges are new again and the whole
    /// list is redrawn.
    fn settle_votes(&mut self, votes: &[VoteEdge], now: Instant) -> Vec<UiUpdate> {
        let annotations = self.votes.reconcile(votes);
        if annotations.fresh_count() > 0 {
            let list = self.arm_highlights(VoteListView::from_annotations(annotations), now);
            return vec![UiUpdate::VoteList(list)];
        }
        let VoteAnnotations::Entries(entries) = annotations else {
            return Vec::new();
        };
        entries
            .into_iter()
            .filter_map(|vote| {
                self.highlights
                    .clear(&vote.edge)
                    .then(|| UiUpdate::VoteHighlightCleared(vote.edge))
            })
            .collect()
    }

    fn arm_highlights(&mut self, list: VoteListView, now: Instant) -> VoteListView {
        match &list {
            VoteListView::NoVotes => self.highlights.clear_all(),
            VoteListView::Entries(rows) => {
                for row in rows {
                    if row.highlighted {
                        self.highlights.set(row.edge.clone(), now, VOTE_HIGHLIGHT);
                    } else {
                        self.highlights.clear(&row.edge);
                    }
                }
            }
        }
        list
    }

    /// Highlight-cleared updates for every edge whose 2 s ran out.
    pub fn expire(&mut self, now: Instant) -> Vec<UiUpdate> {
        self.highlights
            .take_expired(now)
            .into_iter()
            .map(UiUpdate::VoteHighlightCleared)
            .collect()
    }

    /// Start a new game: forget every vote edge seen so far.
    pub fn reset_round(&mut self) {
        self.votes.clear();
        self.highlights.clear_all();
    }

    pub fn pending_highlights(&self) -> usize {
        self.highlights.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
