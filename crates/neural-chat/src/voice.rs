//! Voice input flow.
//!
//! Speech recognition itself is a host service behind [`SpeechRecognizer`].
//! [`VoiceCapture`] tracks one capture session: it accumulates interim
//! results and yields a finalized transcript for the conversation input.

use std::fmt;

use crate::error::ChatError;

const CAPABILITY: &str = "speech recognition";

/// Host speech-recognition service.
pub trait SpeechRecognizer: Send {
    /// Whether the host can recognize speech at all.
    fn is_supported(&self) -> bool;
    /// Begin recognition in the given language.
    fn start(&mut self, language: &str) -> Result<(), ChatError>;
    /// Stop recognition. Pending results may still be delivered.
    fn stop(&mut self) -> Result<(), ChatError>;
}

/// Recognizer for hosts without speech support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _language: &str) -> Result<(), ChatError> {
        Err(ChatError::CapabilityUnavailable(CAPABILITY.to_string()))
    }

    fn stop(&mut self) -> Result<(), ChatError> {
        Ok(())
    }
}

/// State of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Listening,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
        }
    }
}

/// One voice capture session over a recognizer.
pub struct VoiceCapture<R: SpeechRecognizer> {
    recognizer: R,
    state: VoiceState,
    transcript: String,
}

impl<R: SpeechRecognizer> VoiceCapture<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            state: VoiceState::Idle,
            transcript: String::new(),
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_supported()
    }

    /// Current (possibly interim) transcript.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Start listening. Clears any previous transcript.
    pub fn start(&mut self, language: &str) -> Result<(), ChatError> {
        if !self.is_available() {
            return Err(ChatError::CapabilityUnavailable(CAPABILITY.to_string()));
        }
        if self.state == VoiceState::Listening {
            return Err(ChatError::Voice("Voice capture is already active".to_string()));
        }
        self.recognizer.start(language)?;
        self.transcript.clear();
        self.state = VoiceState::Listening;
        tracing::debug!(language, "Voice capture started");
        Ok(())
    }

    /// Replace the transcript with the concatenation of the latest results.
    pub fn on_results<I, S>(&mut self, results: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state != VoiceState::Listening {
            return;
        }
        self.transcript = results
            .into_iter()
            .fold(String::new(), |mut acc, part| {
                acc.push_str(part.as_ref());
                acc
            });
    }

    /// Recognition failed. Returns the error to report; the session ends.
    pub fn on_error(&mut self, reason: &str) -> ChatError {
        tracing::warn!(reason, "Voice capture failed");
        self.state = VoiceState::Idle;
        ChatError::Voice(reason.to_string())
    }

    /// Recognition ended. Yields the trimmed transcript if it is non-empty.
    pub fn on_end(&mut self) -> Option<String> {
        self.state = VoiceState::Idle;
        let finalized = self.transcript.trim();
        if finalized.is_empty() {
            None
        } else {
            Some(finalized.to_string())
        }
    }

    /// Stop listening and finalize.
    pub fn stop(&mut self) -> Result<Option<String>, ChatError> {
        if self.state != VoiceState::Listening {
            return Err(ChatError::Voice("Voice capture is not active".to_string()));
        }
        self.recognizer.stop()?;
        Ok(self.on_end())
    }

    /// Abandon the session, discarding the transcript.
    pub fn close(&mut self) {
        if self.state == VoiceState::Listening {
            if let Err(e) = self.recognizer.stop() {
                tracing::warn!(error = %e, "Failed to stop recognizer on close");
            }
        }
        self.state = VoiceState::Idle;
        self.transcript.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
