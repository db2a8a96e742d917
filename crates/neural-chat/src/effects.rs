//! Fire-and-forget sound effects.
//!
//! The engine only signals which effect to play; synthesis belongs to the
//! host. Sinks must not block and must swallow their own failures.

use std::sync::Mutex;

/// Effects the engine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// A user message was sent.
    Send,
    /// An assistant reply arrived.
    Receive,
    /// A notice was shown.
    Notification,
}

impl SoundEffect {
    /// Tone frequency in hertz.
    pub fn frequency_hz(&self) -> u32 {
        match self {
            SoundEffect::Send => 800,
            SoundEffect::Receive => 600,
            SoundEffect::Notification => 400,
        }
    }

    /// Tone duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        200
    }
}

/// Playback collaborator.
pub trait EffectSink: Send + Sync {
    fn play(&self, effect: SoundEffect);
}

/// Discards every effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentEffects;

impl EffectSink for SilentEffects {
    fn play(&self, _effect: SoundEffect) {}
}

/// Logs effects at debug level instead of playing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEffects;

impl EffectSink for TracingEffects {
    fn play(&self, effect: SoundEffect) {
        tracing::debug!(
            ?effect,
            frequency_hz = effect.frequency_hz(),
            duration_ms = effect.duration_ms(),
            "Sound effect"
        );
    }
}

/// Records played effects. Useful for hosts that batch playback and in tests.
#[derive(Debug, Default)]
pub struct RecordingEffects {
    played: Mutex<Vec<SoundEffect>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects played so far, oldest first.
    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl EffectSink for RecordingEffects {
    fn play(&self, effect: SoundEffect) {
        if let Ok(mut played) = self.played.lock() {
            played.push(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequencies() {
        assert_eq!(SoundEffect::Send.frequency_hz(), 800);
        assert_eq!(SoundEffect::Receive.frequency_hz(), 600);
        assert_eq!(SoundEffect::Notification.frequency_hz(), 400);
    }

    #[test]
    fn test_recording_effects() {
        let sink = RecordingEffects::new();
        sink.play(SoundEffect::Send);
        sink.play(SoundEffect::Receive);
        assert_eq!(sink.played(), vec![SoundEffect::Send, SoundEffect::Receive]);
    }

    #[test]
    fn test_silent_and_tracing_do_not_panic() {
        SilentEffects.play(SoundEffect::Notification);
        TracingEffects.play(SoundEffect::Send);
    }
}
