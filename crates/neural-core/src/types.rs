use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a chat session.
pub type SessionId = Uuid;

/// Identifier of a single message.
pub type MessageId = Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable entry in a session's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content)
    }
}

/// Format how long ago `then` was, relative to `now`, for session lists.
///
/// Under a minute is `今`; then whole minutes, hours and days.
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        "今".to_string()
    } else if secs < 3_600 {
        format!("{}分前", secs / 60)
    } else if secs < 86_400 {
        format!("{}時間前", secs / 3_600)
    } else {
        format!("{}日前", secs / 86_400)
    }
}
