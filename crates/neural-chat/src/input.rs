//! Message input validation and the character counter shown beside the
//! input box.

use crate::error::ChatError;

/// Counter colouring for the input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLevel {
    Normal,
    /// Close to the limit.
    Warning,
    /// Over the limit; sending is disabled.
    Error,
}

/// Live status of the draft message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputStatus {
    pub count: usize,
    pub level: InputLevel,
    pub can_send: bool,
}

/// Compute the counter state for a draft.
pub fn input_status(draft: &str, warn_at: usize, max: usize) -> InputStatus {
    let count = draft.chars().count();
    let level = if count > max {
        InputLevel::Error
    } else if count > warn_at {
        InputLevel::Warning
    } else {
        InputLevel::Normal
    };
    InputStatus {
        count,
        level,
        can_send: count > 0 && count <= max,
    }
}

/// Trim a submitted message and check it against `max` characters.
pub fn validate_message(raw: &str, max: usize) -> Result<String, ChatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if trimmed.chars().count() > max {
        return Err(ChatError::MessageTooLong(max));
    }
    Ok(trimmed.to_string())
}
