//! Conversation controller: central coordinator wiring the session store,
//! the response selector, settings persistence and the presentation events.
//!
//! Each submission runs `Idle -> AwaitingResponse -> Idle`. The reply is
//! produced by a tokio task after a delay derived from the response speed
//! setting; at most one such task is outstanding at a time. All mutable
//! state lives in one [`AppState`] behind a mutex owned by the controller.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use neural_core::config::ChatConfig;
use neural_core::settings::{MAX_RESPONSE_SPEED, MIN_RESPONSE_SPEED};
use neural_core::{
    load_settings, save_settings, ChatEvent, ChatMessage, MessageId, NoticeLevel, SessionId,
    Settings, SettingsPatch, SettingsStorage,
};

use crate::effects::{EffectSink, SilentEffects, SoundEffect};
use crate::error::ChatError;
use crate::input::{input_status, validate_message, InputStatus};
use crate::reveal::spawn_reveal;
use crate::selector::ResponseSelector;
use crate::store::{SessionStore, SessionSummary};

/// Reply delay for a response speed: `(6 - speed) * 500ms + 500ms`.
///
/// Speeds outside 1..=5 are clamped first, so the delay ranges from 1s
/// (fastest) to 3s (slowest).
pub fn reply_delay(speed: u8) -> Duration {
    let speed = u64::from(speed.clamp(MIN_RESPONSE_SPEED, MAX_RESPONSE_SPEED));
    Duration::from_millis((6 - speed) * 500 + 500)
}

/// Phase of the pending-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

/// Tunables for the controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub max_message_length: usize,
    pub warn_message_length: usize,
    pub typing_interval: Duration,
    pub event_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for ControllerOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            max_message_length: config.max_message_length,
            warn_message_length: config.warn_message_length,
            typing_interval: Duration::from_millis(config.typing_interval_ms),
            event_capacity: config.event_capacity.max(1),
        }
    }
}

struct PendingReply {
    session_id: SessionId,
    token: CancellationToken,
}

/// Everything the controller mutates.
struct AppState {
    store: SessionStore,
    settings: Settings,
    phase: Phase,
    rng: StdRng,
    pending: Option<PendingReply>,
    reveal: Option<CancellationToken>,
}

impl AppState {
    fn cancel_reveal(&mut self) {
        if let Some(token) = self.reveal.take() {
            token.cancel();
        }
    }
}

struct Inner {
    state: Mutex<AppState>,
    selector: ResponseSelector,
    storage: Arc<dyn SettingsStorage>,
    effects: Arc<dyn EffectSink>,
    events: broadcast::Sender<ChatEvent>,
    options: ControllerOptions,
    load_warning: Option<String>,
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, AppState>, ChatError> {
        self.state
            .lock()
            .map_err(|e| ChatError::Storage(format!("state lock poisoned: {}", e)))
    }

    fn emit(&self, event: ChatEvent) {
        debug!(event = event.kind(), "Emitting chat event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn play(&self, effect: SoundEffect, enabled: bool) {
        if enabled {
            self.effects.play(effect);
        }
    }

    fn notify(&self, level: NoticeLevel, text: impl Into<String>, sound: bool) {
        self.emit(ChatEvent::notice(level, text));
        self.play(SoundEffect::Notification, sound);
    }

    /// Produce the assistant reply for a pending request and append it to
    /// whichever session is active when the delay elapses.
    fn deliver_reply(&self, origin: SessionId, user_text: &str, token: &CancellationToken) {
        let (session_id, message, show_typing, sound, reveal_token) = {
            let mut guard = match self.lock() {
                Ok(g) => g,
                Err(e) => {
                    error!(error = %e, "Dropping reply");
                    return;
                }
            };
            if token.is_cancelled() {
                return;
            }
            let state = &mut *guard;
            let session_id = state.store.active_id();
            if session_id != origin {
                debug!(%origin, %session_id, "Active session changed while awaiting reply");
            }

            let reply = self.selector.select(user_text, &state.settings, &mut state.rng);
            let message = ChatMessage::assistant(reply.text);
            if let Err(e) = state.store.append_message(session_id, message.clone()) {
                warn!(error = %e, "Active session vanished before reply");
            }
            state.phase = Phase::Idle;
            state.pending = None;

            let show_typing = state.settings.show_typing;
            let reveal_token = if show_typing {
                state.cancel_reveal();
                let t = CancellationToken::new();
                state.reveal = Some(t.clone());
                Some(t)
            } else {
                None
            };
            (
                session_id,
                message,
                show_typing,
                state.settings.sound_effects,
                reveal_token,
            )
        };

        info!(%session_id, message_id = %message.id, "Assistant reply appended");
        let message_id = message.id;
        let text = message.content.clone();
        self.emit(ChatEvent::MessageAppended {
            session_id,
            message,
        });
        self.emit(ChatEvent::SessionListChanged);
        if let (true, Some(t)) = (show_typing, reveal_token) {
            spawn_reveal(
                message_id,
                &text,
                self.options.typing_interval,
                self.events.clone(),
                t,
            );
        }
        self.emit(ChatEvent::ThinkingStateChanged { thinking: false });
        self.play(SoundEffect::Receive, sound);
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ConversationController`].
pub struct ControllerBuilder {
    storage: Arc<dyn SettingsStorage>,
    options: ControllerOptions,
    selector: ResponseSelector,
    effects: Arc<dyn EffectSink>,
    seed: Option<u64>,
}

impl ControllerBuilder {
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn selector(mut self, selector: ResponseSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn effects(mut self, effects: Arc<dyn EffectSink>) -> Self {
        self.effects = effects;
        self
    }

    /// Seed the reply randomness for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load settings and create the controller with one fresh session.
    pub fn build(self) -> ConversationController {
        let loaded = load_settings(self.storage.as_ref());
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (events, _) = broadcast::channel(self.options.event_capacity);

        let state = AppState {
            store: SessionStore::new(),
            settings: loaded.settings,
            phase: Phase::Idle,
            rng,
            pending: None,
            reveal: None,
        };
        info!("Conversation controller ready");

        ConversationController {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                selector: self.selector,
                storage: self.storage,
                effects: self.effects,
                events,
                options: self.options,
                load_warning: loaded.warning,
            }),
        }
    }
}

// =============================================================================
// ConversationController
// =============================================================================

/// Orchestrates submissions, replies, sessions and settings.
///
/// Cloning is cheap; clones share the same state. Methods that schedule work
/// must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ConversationController {
    inner: Arc<Inner>,
}

impl ConversationController {
    pub fn builder(storage: Arc<dyn SettingsStorage>) -> ControllerBuilder {
        ControllerBuilder {
            storage,
            options: ControllerOptions::default(),
            selector: ResponseSelector::default(),
            effects: Arc::new(SilentEffects),
            seed: None,
        }
    }

    /// Subscribe to presentation events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// The settings read error from startup, if the stored document was unusable.
    pub fn settings_warning(&self) -> Option<ChatError> {
        self.inner
            .load_warning
            .as_ref()
            .map(|w| ChatError::PersistenceRead(w.clone()))
    }

    /// Submit a user message to the active session.
    ///
    /// Rejects blank and over-length input, and any submission while a reply
    /// is pending, without changing state. On success the assistant reply is
    /// appended after [`reply_delay`].
    pub fn submit_user_message(&self, text: &str) -> Result<MessageId, ChatError> {
        let content = validate_message(text, self.inner.options.max_message_length)?;

        let (session_id, message, delay, sound, token) = {
            let mut state = self.inner.lock()?;
            if state.phase != Phase::Idle {
                debug!("Submission ignored while awaiting response");
                return Err(ChatError::Busy);
            }

            let session_id = state.store.active_id();
            let message = ChatMessage::user(content.clone());
            state.store.append_message(session_id, message.clone())?;

            let token = CancellationToken::new();
            state.phase = Phase::AwaitingResponse;
            state.pending = Some(PendingReply {
                session_id,
                token: token.clone(),
            });
            (
                session_id,
                message,
                reply_delay(state.settings.response_speed),
                state.settings.sound_effects,
                token,
            )
        };

        let message_id = message.id;
        debug!(
            %session_id,
            %message_id,
            delay_ms = delay.as_millis() as u64,
            "User message accepted"
        );
        self.inner.emit(ChatEvent::MessageAppended {
            session_id,
            message,
        });
        self.inner.emit(ChatEvent::SessionListChanged);
        self.inner
            .emit(ChatEvent::ThinkingStateChanged { thinking: true });
        self.inner.play(SoundEffect::Send, sound);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%session_id, "Pending reply cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    inner.deliver_reply(session_id, &content, &token);
                }
            }
        });

        Ok(message_id)
    }

    /// Submit a finalized voice transcript as a user message.
    pub fn submit_transcript(&self, transcript: &str) -> Result<MessageId, ChatError> {
        debug!(chars = transcript.chars().count(), "Submitting voice transcript");
        self.submit_user_message(transcript)
    }

    /// Start a new session and make it active.
    pub fn request_new_session(&self) -> Result<SessionId, ChatError> {
        let (id, sound) = {
            let mut state = self.inner.lock()?;
            state.cancel_reveal();
            (state.store.create_session(), state.settings.sound_effects)
        };
        info!(session_id = %id, "New session started");
        self.inner.emit(ChatEvent::SessionListChanged);
        self.inner
            .notify(NoticeLevel::Success, "新しいチャットを開始しました", sound);
        Ok(id)
    }

    /// Make `session_id` the active session. A no-op if it already is.
    pub fn request_session_switch(&self, session_id: SessionId) -> Result<(), ChatError> {
        {
            let mut state = self.inner.lock()?;
            if state.store.active_id() == session_id {
                return Ok(());
            }
            state.store.switch_active(session_id)?;
            state.cancel_reveal();
        }
        debug!(%session_id, "Switched active session");
        self.inner.emit(ChatEvent::SessionListChanged);
        Ok(())
    }

    /// Clear the active session's messages in place.
    pub fn clear_active_session(&self) -> Result<(), ChatError> {
        let sound = {
            let mut state = self.inner.lock()?;
            let active = state.store.active_id();
            state.store.clear_messages(active)?;
            state.cancel_reveal();
            state.settings.sound_effects
        };
        self.inner.emit(ChatEvent::SessionListChanged);
        self.inner
            .notify(NoticeLevel::Success, "チャット履歴を削除しました", sound);
        Ok(())
    }

    /// Merge `patch` over the current settings and persist the result.
    ///
    /// The in-memory settings change only if the save succeeds.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, ChatError> {
        let updated = self.apply_with(|_| patch.clone())?;
        self.inner
            .notify(NoticeLevel::Success, "設定を保存しました", updated.sound_effects);
        Ok(updated)
    }

    /// Flip between dark and light theme.
    pub fn toggle_theme(&self) -> Result<Settings, ChatError> {
        let updated = self.apply_with(|current| SettingsPatch {
            is_dark_theme: Some(!current.is_dark_theme),
            ..SettingsPatch::default()
        })?;
        let dark = updated.is_dark_theme;
        let label = if dark { "ダーク" } else { "ライト" };
        self.inner.notify(
            NoticeLevel::Success,
            format!("{}テーマに切り替えました", label),
            updated.sound_effects,
        );
        Ok(updated)
    }

    /// Build a patch from the current settings, then merge, persist and
    /// commit it under one lock so concurrent updates cannot overwrite each
    /// other.
    fn apply_with<F>(&self, make_patch: F) -> Result<Settings, ChatError>
    where
        F: FnOnce(&Settings) -> SettingsPatch,
    {
        let saved = {
            let mut state = self.inner.lock()?;
            let patch = make_patch(&state.settings);
            let mut updated = state.settings.clone();
            patch.apply_to(&mut updated);
            debug!(?patch, "Applying settings patch");
            match save_settings(self.inner.storage.as_ref(), &updated) {
                Ok(()) => {
                    state.settings = updated.clone();
                    Ok(updated)
                }
                Err(e) => Err((e, updated.sound_effects)),
            }
        };

        match saved {
            Ok(updated) => Ok(updated),
            Err((e, sound)) => {
                warn!(error = %e, "Failed to save settings");
                self.inner.notify(
                    NoticeLevel::Error,
                    format!("設定を保存できませんでした: {}", e),
                    sound,
                );
                Err(e.into())
            }
        }
    }

    /// Drop the persisted settings and restore defaults.
    pub fn reset_settings(&self) -> Result<Settings, ChatError> {
        let defaults = Settings::default();
        {
            let mut state = self.inner.lock()?;
            self.inner.storage.remove()?;
            state.settings = defaults.clone();
        }
        info!("Settings reset to defaults");
        self.inner
            .notify(NoticeLevel::Success, "設定をリセットしました", defaults.sound_effects);
        Ok(defaults)
    }

    /// Cancel the pending reply and any reveal. The controller stays usable.
    pub fn shutdown(&self) {
        let was_thinking = match self.inner.lock() {
            Ok(mut state) => {
                if let Some(pending) = state.pending.take() {
                    debug!(session_id = %pending.session_id, "Cancelling pending reply");
                    pending.token.cancel();
                }
                state.cancel_reveal();
                let was = state.phase == Phase::AwaitingResponse;
                state.phase = Phase::Idle;
                was
            }
            Err(e) => {
                error!(error = %e, "Shutdown could not acquire state");
                false
            }
        };
        if was_thinking {
            self.inner
                .emit(ChatEvent::ThinkingStateChanged { thinking: false });
        }
        info!("Conversation controller shut down");
    }

    // -- Queries --

    pub fn settings(&self) -> Result<Settings, ChatError> {
        Ok(self.inner.lock()?.settings.clone())
    }

    pub fn phase(&self) -> Phase {
        self.inner
            .lock()
            .map(|s| s.phase)
            .unwrap_or(Phase::Idle)
    }

    pub fn is_thinking(&self) -> bool {
        self.phase() == Phase::AwaitingResponse
    }

    pub fn active_session_id(&self) -> Result<SessionId, ChatError> {
        Ok(self.inner.lock()?.store.active_id())
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.inner
            .lock()
            .map(|s| s.store.list_sessions())
            .unwrap_or_default()
    }

    pub fn messages(&self, session_id: SessionId) -> Result<Vec<ChatMessage>, ChatError> {
        self.inner.lock()?.store.messages(session_id)
    }

    pub fn active_messages(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let state = self.inner.lock()?;
        state.store.messages(state.store.active_id())
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.inner.options
    }

    /// Counter state for a draft under the configured limits.
    pub fn input_status(&self, draft: &str) -> InputStatus {
        let options = &self.inner.options;
        input_status(draft, options.warn_message_length, options.max_message_length)
    }
}

// =============================================================================
// Tests
// =============================================================================
