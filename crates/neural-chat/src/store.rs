//! In-memory session store.
//!
//! Holds every chat session created during the process lifetime, keyed by
//! id, and tracks which one is active. Sessions are never removed; the only
//! destructive operation is clearing a session's log in place.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use neural_core::{ChatMessage, SessionId};

use crate::error::ChatError;

/// Title given to every new session.
pub const DEFAULT_SESSION_TITLE: &str = "新しいチャット";

/// Preview shown for a session with no messages.
pub const EMPTY_SESSION_PREVIEW: &str = "Neural Chatへようこそ！";

const PREVIEW_CHARS: usize = 50;

/// One conversation thread.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Store-wide touch counter; orders sessions touched within the same clock tick.
    touch_seq: u64,
}

impl ChatSession {
    /// Preview of the latest message, for session lists.
    pub fn preview(&self) -> String {
        match self.messages.last() {
            Some(last) => {
                let head: String = last.content.chars().take(PREVIEW_CHARS).collect();
                format!("{}...", head)
            }
            None => EMPTY_SESSION_PREVIEW.to_string(),
        }
    }
}

/// Summary row for listing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub preview: String,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    pub active: bool,
}

/// Session store with exactly one active session at all times.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<SessionId, ChatSession>,
    active: SessionId,
    touch_counter: u64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store holding one fresh, active session.
    pub fn new() -> Self {
        let mut store = Self {
            sessions: HashMap::new(),
            active: Uuid::nil(),
            touch_counter: 0,
        };
        store.create_session();
        store
    }

    /// Insert an empty session and make it active.
    pub fn create_session(&mut self) -> SessionId {
        let mut id = Uuid::new_v4();
        while self.sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let now = Utc::now();
        let seq = self.next_seq();
        self.sessions.insert(
            id,
            ChatSession {
                id,
                title: DEFAULT_SESSION_TITLE.to_string(),
                messages: Vec::new(),
                created_at: now,
                last_activity: now,
                touch_seq: seq,
            },
        );
        self.active = id;
        tracing::debug!(session_id = %id, "Session created");
        id
    }

    /// Append a message to a session's log and bump its activity.
    pub fn append_message(
        &mut self,
        session_id: SessionId,
        message: ChatMessage,
    ) -> Result<(), ChatError> {
        let seq = self.next_seq();
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        session.last_activity = message.timestamp.max(session.last_activity);
        session.touch_seq = seq;
        session.messages.push(message);
        Ok(())
    }

    /// All sessions, most recently active first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<&ChatSession> = self.sessions.values().collect();
        sessions.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then(b.touch_seq.cmp(&a.touch_seq))
        });
        sessions
            .into_iter()
            .map(|s| SessionSummary {
                id: s.id,
                title: s.title.clone(),
                preview: s.preview(),
                last_activity: s.last_activity,
                message_count: s.messages.len(),
                active: s.id == self.active,
            })
            .collect()
    }

    /// Make an existing session the active one.
    pub fn switch_active(&mut self, session_id: SessionId) -> Result<(), ChatError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(ChatError::SessionNotFound(session_id));
        }
        self.active = session_id;
        Ok(())
    }

    /// Empty a session's log in place. The session itself remains.
    pub fn clear_messages(&mut self, session_id: SessionId) -> Result<(), ChatError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        session.messages.clear();
        Ok(())
    }

    pub fn active_id(&self) -> SessionId {
        self.active
    }

    pub fn active(&self) -> &ChatSession {
        // `active` always names an inserted session: it is only ever assigned
        // by `create_session` or after a `contains_key` check.
        &self.sessions[&self.active]
    }

    pub fn get(&self, session_id: SessionId) -> Option<&ChatSession> {
        self.sessions.get(&session_id)
    }

    /// Copy of a session's messages in insertion order.
    pub fn messages(&self, session_id: SessionId) -> Result<Vec<ChatMessage>, ChatError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.messages.clone())
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn next_seq(&mut self) -> u64 {
        self.touch_counter += 1;
        self.touch_counter
    }
}

// =============================================================================
// Tests
// =============================================================================
