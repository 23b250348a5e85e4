// Chat log: append-only transcript with non-destructive filtered views.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use super::parse_timestamp;
use crate::protocol::ChatPayload;

/// Sender name the server uses for its own announcements.
pub const NARRATOR: &str = "Narrator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Public,
    Mafia,
    Private,
    /// Missing or unrecognized `chat_type`, kept verbatim. Only the `all`
    /// filter shows these.
    Other(String),
}

impl Channel {
    pub fn parse(raw: &str) -> Channel {
        match raw {
            "public" => Channel::Public,
            "mafia" => Channel::Mafia,
            "private" => Channel::Private,
            other => {
                warn!("Unknown chat type `{}`, only shown unfiltered", other);
                Channel::Other(other.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Position in the log, assigned on append.
    pub seq: u64,
    pub sender: String,
    pub channel: Channel,
    /// Raw text as sent by the server.
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl ChatMessage {
    /// Build a message from a `new_message` payload. `received_at` stands in
    /// for a missing or unparsable server timestamp.
    pub fn from_payload(payload: ChatPayload, received_at: NaiveDateTime) -> ChatMessage {
        let timestamp = payload
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(received_at);
        ChatMessage {
            seq: 0,
            sender: payload.sender,
            channel: Channel::parse(&payload.chat_type),
            content: payload.message,
            timestamp,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown chat filter `{0}`")]
pub struct UnknownFilter(pub String);

/// Chat view selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatFilter {
    #[default]
    All,
    Public,
    Mafia,
    Narrator,
}

impl ChatFilter {
    pub const ALL: [ChatFilter; 4] = [
        ChatFilter::All,
        ChatFilter::Public,
        ChatFilter::Mafia,
        ChatFilter::Narrator,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ChatFilter::All => "all",
            ChatFilter::Public => "public",
            ChatFilter::Mafia => "mafia",
            ChatFilter::Narrator => "narrator",
        }
    }

    pub fn matches(self, message: &ChatMessage) -> bool {
        match self {
            ChatFilter::All => true,
            ChatFilter::Public => message.channel == Channel::Public,
            ChatFilter::Mafia => message.channel == Channel::Mafia,
            ChatFilter::Narrator => message.sender == NARRATOR,
        }
    }

    /// The next filter in display order, wrapping around.
    pub fn next(self) -> ChatFilter {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for ChatFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatFilter::ALL
            .into_iter()
            .find(|f| f.tag() == s)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

impl fmt::Display for ChatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The ordered transcript. Entries are never edited or reordered; only
/// `clear` removes them.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_seq: u64,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the log and return the stored entry.
    pub fn append(&mut self, mut message: ChatMessage) -> &ChatMessage {
        message.seq = self.next_seq;
        self.next_seq += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Empty the log for a new game.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_seq = 0;
    }

    /// Lazily iterate the messages `filter` selects, in log order. The
    /// iterator is `Clone`, so it can be walked more than once.
    pub fn filtered_view(
        &self,
        filter: ChatFilter,
    ) -> impl Iterator<Item = &ChatMessage> + Clone + '_ {
        self.messages.iter().filter(move |m| filter.matches(m))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
