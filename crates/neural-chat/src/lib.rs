//! Conversation engine for Neural Chat.
//!
//! Provides the in-memory session store, keyword-based response selection,
//! and the controller that sequences user submissions, simulated replies,
//! typing reveal, sound effects and settings persistence.

pub mod catalog;
pub mod controller;
pub mod effects;
pub mod error;
pub mod input;
pub mod reveal;
pub mod selector;
pub mod store;
pub mod voice;

pub use catalog::{Category, ResponseCatalog};
pub use controller::{
    reply_delay, ControllerBuilder, ControllerOptions, ConversationController, Phase,
};
pub use effects::{EffectSink, RecordingEffects, SilentEffects, SoundEffect, TracingEffects};
pub use error::ChatError;
pub use input::{input_status, validate_message, InputLevel, InputStatus};
pub use selector::{Reply, ResponseSelector};
pub use store::{ChatSession, SessionStore, SessionSummary};
pub use voice::{SpeechRecognizer, UnsupportedRecognizer, VoiceCapture, VoiceState};
