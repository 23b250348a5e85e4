// Vote reconciliation: classify each live vote as new or already shown.

use std::collections::HashSet;

/// A directed voter -> target relationship. A voter has at most one live
/// edge; a new target supersedes the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoteEdge {
    pub voter: String,
    pub target: String,
}

impl VoteEdge {
    pub fn new(voter: impl Into<String>, target: impl Into<String>) -> Self {
        VoteEdge {
            voter: voter.into(),
            target: target.into(),
        }
    }

    /// Composite key stored in the seen-set.
    pub fn key(&self) -> String {
        format!("{}->{}", self.voter, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedVote {
    pub edge: VoteEdge,
    /// First time this exact edge is shown in the current round.
    pub fresh: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteAnnotations {
    /// Sentinel for an empty vote map.
    NoVotes,
    Entries(Vec<AnnotatedVote>),
}

impl VoteAnnotations {
    pub fn fresh_count(&self) -> usize {
        match self {
            VoteAnnotations::NoVotes => 0,
            VoteAnnotations::Entries(entries) => entries.iter().filter(|v| v.fresh).count(),
        }
    }
}

/// Remembers every edge shown during the current voting round.
///
/// Superseded edges (a voter who switched targets) stay in the set until the
/// round ends; an empty vote map is the only reset.
#[derive(Debug, Default)]
pub struct VoteReconciler {
    seen: HashSet<String>,
}

impl VoteReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate `votes` (in reported order) against the seen-set and record
    /// them.
    pub fn reconcile(&mut self, votes: &[VoteEdge]) -> VoteAnnotations {
        if votes.is_empty() {
            self.seen.clear();
            return VoteAnnotations::NoVotes;
        }

        let entries = votes
            .iter()
            .map(|edge| AnnotatedVote {
                edge: edge.clone(),
                fresh: self.seen.insert(edge.key()),
            })
            .collect();
        VoteAnnotations::Entries(entries)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
