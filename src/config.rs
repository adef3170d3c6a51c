use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::capture::CaptureSource;
use crate::playback::{SpeechParams, Voice, VoiceSelector};
use crate::session::SessionConfig;

/// Prefix for environment overrides, e.g. `FOLIO_VOICE__TRANSPORT__BASE_URL`
pub const ENV_PREFIX: &str = "FOLIO_VOICE";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transport: TransportConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct TransportConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub source: CaptureSource,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    pub voice_name: String,
    pub voice_locale: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub words_per_minute: u32,
    #[serde(default)]
    pub voices: Vec<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    pub listen_start_delay_ms: u64,
    pub relisten_delay_ms: u64,
}

impl Config {
    /// Load configuration from an optional file at `path` (any extension
    /// the `config` crate recognizes), overridden by `FOLIO_VOICE__*`
    /// environment variables. Every key has a default.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "folio-voice")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 7878)?
            .set_default("transport.base_url", "ws://localhost:8000/ws")?
            .set_default("capture.source", "stdin")?
            .set_default("playback.voice_name", "Google UK English Male")?
            .set_default("playback.voice_locale", "en-GB")?
            .set_default("playback.rate", 1.2)?
            .set_default("playback.pitch", 0.7)?
            .set_default("playback.volume", 1.0)?
            .set_default("playback.words_per_minute", 160)?
            .set_default("timing.listen_start_delay_ms", 300)?
            .set_default("timing.relisten_delay_ms", 400)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_url: self.transport.base_url.clone(),
            listen_start_delay: Duration::from_millis(self.timing.listen_start_delay_ms),
            relisten_delay: Duration::from_millis(self.timing.relisten_delay_ms),
            voice: VoiceSelector {
                name: self.playback.voice_name.clone(),
                locale: self.playback.voice_locale.clone(),
            },
        }
    }

    pub fn speech_params(&self) -> SpeechParams {
        SpeechParams {
            rate: self.playback.rate,
            pitch: self.playback.pitch,
            volume: self.playback.volume,
        }
    }
}
