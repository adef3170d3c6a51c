use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::EventSink;

/// Events emitted by an utterance
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The utterance finished on its own (never emitted after `cancel`)
    Ended,
    Error(String),
}

/// A voice reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP-47 locale, e.g. "en-GB"
    pub locale: String,
}

/// Preferred voice, matched on name and locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelector {
    pub name: String,
    pub locale: String,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self {
            name: "Google UK English Male".to_string(),
            locale: "en-GB".to_string(),
        }
    }
}

impl VoiceSelector {
    pub fn matches(&self, voice: &Voice) -> bool {
        voice.name == self.name && voice.locale == self.locale
    }
}

/// Prosody applied to every utterance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            rate: 1.2,
            pitch: 0.7,
            volume: 1.0,
        }
    }
}

/// Pick the voice for an utterance.
///
/// Exact name+locale match first, then the first platform voice. `None`
/// means the platform default voice; playback still proceeds.
pub fn select_voice<'a>(voices: &'a [Voice], selector: &VoiceSelector) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|voice| selector.matches(voice))
        .or_else(|| voices.first())
}

/// Text-to-speech playback trait
///
/// Single-utterance-at-a-time: `speak` cancels whatever is playing first.
#[async_trait::async_trait]
pub trait SpeechPlayback: Send {
    /// Speak exactly one utterance, cancelling the current one first
    async fn speak(
        &mut self,
        text: &str,
        voice: &VoiceSelector,
        events: EventSink<PlaybackEvent>,
    ) -> Result<()>;

    /// Stop playback immediately; idempotent
    async fn cancel(&mut self) -> Result<()>;

    /// Check if an utterance is currently playing
    fn is_speaking(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
