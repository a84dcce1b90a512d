// ABOUTME: Core types for bytedge - Message, HistoryEntry, TurnState, TurnEvent, TurnOutcome
// ABOUTME: These are the data structures that flow from the engine to the embedding shell

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::format;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// One displayed message. Built once by the engine and handed out as clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Who sent it
    pub sender: Sender,
    /// Raw text as typed or as returned by the backend
    pub text: String,
    /// HTML rendering of `text`
    pub display: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// True when this is a failure notice rather than a real answer
    pub is_error: bool,
}

impl Message {
    fn new(sender: Sender, text: &str, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.to_string(),
            display: format::format(text),
            timestamp: Utc::now(),
            is_error,
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text, false)
    }

    pub fn agent(text: &str) -> Self {
        Self::new(Sender::Agent, text, false)
    }

    pub fn agent_error(text: &str) -> Self {
        Self::new(Sender::Agent, text, true)
    }

    /// Clock time shown under a bubble, e.g. "03:41 PM"
    pub fn format_time(&self) -> String {
        self.timestamp.format("%I:%M %p").to_string()
    }
}

/// A completed exchange. Only successful turns produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
}

/// Whether the engine can accept a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    #[default]
    Idle,
    Busy,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Busy => write!(f, "busy"),
        }
    }
}

/// Events broadcast to whoever renders the conversation
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Turn state flipped; Busy doubles as the typing indicator
    StateChanged(TurnState),
    /// A message should be displayed
    Message(Message),
    /// The conversation was reset
    Cleared,
}

/// Why a submission was dropped without starting a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Nothing left after trimming
    Empty,
    /// Another turn is outstanding
    Busy,
}

/// What a call to `submit` did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// No turn was started
    Ignored(IgnoreReason),
    /// The backend answered; the exchange is in history
    Answered(Message),
    /// The backend failed; an error notice was shown and history is untouched
    Failed(Message),
    /// The engine was reset while the turn was in flight; the result was dropped
    Discarded,
}

impl TurnOutcome {
    /// The agent message produced by this turn, if any
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Answered(m) | Self::Failed(m) => Some(m),
            Self::Ignored(_) | Self::Discarded => None,
        }
    }
}
