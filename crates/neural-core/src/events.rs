use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, MessageId, SessionId};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Events published by the conversation controller for the presentation layer.
///
/// Delivered over a broadcast channel; a slow subscriber may miss events and
/// should re-read state from the controller when it lags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChatEvent {
    /// A message was appended to a session's log.
    MessageAppended {
        session_id: SessionId,
        message: ChatMessage,
    },

    /// Sessions were created, switched, cleared or reordered.
    SessionListChanged,

    /// The assistant started (`true`) or finished (`false`) composing a reply.
    ThinkingStateChanged { thinking: bool },

    /// The first `visible` characters of an assistant message are now shown.
    RevealProgress {
        message_id: MessageId,
        visible: usize,
        total: usize,
    },

    /// A non-fatal message for the user.
    Notice { level: NoticeLevel, text: String },
}

impl ChatEvent {
    pub fn notice(level: NoticeLevel, text: impl Into<String>) -> Self {
        ChatEvent::Notice {
            level,
            text: text.into(),
        }
    }

    /// Short event name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::MessageAppended { .. } => "message_appended",
            ChatEvent::SessionListChanged => "session_list_changed",
            ChatEvent::ThinkingStateChanged { .. } => "thinking_state_changed",
            ChatEvent::RevealProgress { .. } => "reveal_progress",
            ChatEvent::Notice { .. } => "notice",
        }
    }
}
