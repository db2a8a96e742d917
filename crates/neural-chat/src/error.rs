//! Error types for the conversation engine.

use neural_core::error::NeuralError;
use neural_core::SessionId;

/// Errors from the chat engine.
///
/// None of these are fatal: every failure leaves state unchanged and is
/// reported to the user as a notice at most.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a reply is already being composed")]
    Busy,
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("failed to read settings: {0}")]
    PersistenceRead(String),
    #[error("{0} is not supported on this host")]
    CapabilityUnavailable(String),
    #[error("voice error: {0}")]
    Voice(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid response catalog: {0}")]
    InvalidCatalog(String),
}

impl ChatError {
    /// Whether this error belongs to the invalid-input class.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ChatError::EmptyMessage | ChatError::MessageTooLong(_))
    }
}

impl From<NeuralError> for ChatError {
    fn from(err: NeuralError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::Busy.to_string(),
            "a reply is already being composed"
        );
        assert_eq!(
            ChatError::PersistenceRead("bad json".to_string()).to_string(),
            "failed to read settings: bad json"
        );
        assert_eq!(
            ChatError::CapabilityUnavailable("speech recognition".to_string()).to_string(),
            "speech recognition is not supported on this host"
        );
        assert_eq!(
            ChatError::Voice("no-speech".to_string()).to_string(),
            "voice error: no-speech"
        );
    }

    #[test]
    fn test_session_not_found_preserves_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::SessionNotFound(id).to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_invalid_input_class() {
        assert!(ChatError::EmptyMessage.is_invalid_input());
        assert!(ChatError::MessageTooLong(1).is_invalid_input());
        assert!(!ChatError::Busy.is_invalid_input());
        assert!(!ChatError::SessionNotFound(Uuid::nil()).is_invalid_input());
    }

    #[test]
    fn test_from_neural_error() {
        let err: ChatError = NeuralError::Settings("disk full".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
