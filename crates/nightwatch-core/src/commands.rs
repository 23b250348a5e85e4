// Command emitter: user intents -> outbound server commands and local
// filter state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::protocol::OutboundCommand;
use crate::state::chat::ChatFilter;

/// Minimum spacing between two `start_game` commands.
pub const START_COOLDOWN: Duration = Duration::from_secs(3);

pub struct CommandEmitter {
    out_tx: mpsc::Sender<OutboundCommand>,
    /// When the start affordance becomes available again.
    start_ready_at: Option<Instant>,
    filter: ChatFilter,
}

impl CommandEmitter {
    pub fn new(out_tx: mpsc::Sender<OutboundCommand>, filter: ChatFilter) -> Self {
        CommandEmitter {
            out_tx,
            start_ready_at: None,
            filter,
        }
    }

    /// Emit `start_game` unless a previous start is still cooling down.
    /// Returns whether the command was sent.
    pub async fn request_start(&mut self, now: Instant) -> bool {
        if self.start_cooling_down(now) {
            info!("Start request suppressed: cooldown active");
            return false;
        }
        self.start_ready_at = Some(now + START_COOLDOWN);
        self.send(OutboundCommand::StartGame).await;
        true
    }

    /// Emit `stop_game`. Never suppressed.
    pub async fn request_stop(&mut self) {
        self.send(OutboundCommand::StopGame).await;
    }

    /// Ask the server for a fresh full snapshot.
    pub async fn request_state(&mut self) {
        self.send(OutboundCommand::RequestState).await;
    }

    /// Select the chat filter named by `tag`. Returns the new filter, or
    /// `None` when the tag is not recognized (a programming error: debug
    /// builds panic).
    pub fn set_filter(&mut self, tag: &str) -> Option<ChatFilter> {
        match tag.parse::<ChatFilter>() {
            Ok(filter) => {
                self.filter = filter;
                Some(filter)
            }
            Err(e) => {
                if cfg!(debug_assertions) {
                    panic!("{}", e);
                }
                warn!("Ignoring {}", e);
                None
            }
        }
    }

    pub fn filter(&self) -> ChatFilter {
        self.filter
    }

    pub fn start_cooling_down(&self, now: Instant) -> bool {
        self.start_ready_at.is_some_and(|at| now < at)
    }

    /// Cancel the start cooldown (game stopped, or connection lost).
    pub fn reset_cooldown(&mut self) {
        self.start_ready_at = None;
    }

    async fn send(&self, command: OutboundCommand) {
        info!("Sending {}", command.event_name());
        if let Err(e) = self.out_tx.send(command).await {
            warn!("Outbound channel closed, dropped {}", e.0.event_name());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
