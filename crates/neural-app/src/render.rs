//! Terminal bookkeeping for assistant replies revealed one character at a time.

use std::collections::HashMap;

use neural_core::MessageId;

/// Replies whose typing reveal is in progress on the current line.
#[derive(Debug, Default)]
pub struct RevealLines {
    open: HashMap<MessageId, (Vec<char>, usize)>,
}

impl RevealLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a reply. Returns the line prefix to print.
    pub fn start(&mut self, message_id: MessageId, content: &str) -> &'static str {
        self.open.insert(message_id, (content.chars().collect(), 0));
        "Neural: "
    }

    /// Text to print for a progress update, with a trailing newline once the
    /// reply is complete. `None` for replies that are not tracked.
    pub fn progress(
        &mut self,
        message_id: MessageId,
        visible: usize,
        total: usize,
    ) -> Option<String> {
        let (chars, printed) = self.open.get_mut(&message_id)?;
        let end = visible.min(chars.len());
        let mut chunk: String = chars[(*printed).min(end)..end].iter().collect();
        *printed = end;
        if visible >= total {
            chunk.push('\n');
            self.open.remove(&message_id);
        }
        Some(chunk)
    }

    /// Drop every unfinished reply. Returns `true` when a line was left open
    /// and the caller must terminate it.
    pub fn abandon(&mut self) -> bool {
        let had_open = !self.open.is_empty();
        self.open.clear();
        had_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_progress_prints_only_new_characters() {
        let mut lines = RevealLines::new();
        let id = Uuid::new_v4();
        assert_eq!(lines.start(id, "こんにちは"), "Neural: ");
        assert_eq!(lines.progress(id, 2, 5).as_deref(), Some("こん"));
        assert_eq!(lines.progress(id, 3, 5).as_deref(), Some("に"));
        assert_eq!(lines.progress(id, 5, 5).as_deref(), Some("ちは\n"));
        assert!(!lines.abandon());
    }

    #[test]
    fn test_abandon_closes_unfinished_line() {
        let mut lines = RevealLines::new();
        let id = Uuid::new_v4();
        lines.start(id, "hello");
        lines.progress(id, 2, 5);

        assert!(lines.abandon());
        // Late progress from the cancelled reveal is ignored.
        assert!(lines.progress(id, 3, 5).is_none());
        assert!(!lines.abandon());
    }

    #[test]
    fn test_untracked_reply_is_ignored() {
        let mut lines = RevealLines::new();
        assert!(lines.progress(Uuid::new_v4(), 1, 1).is_none());
    }
}
