use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::playback::VoiceSelector;

/// Configuration for conversation sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Transport base address; the client identifier is appended per session
    /// (e.g. "ws://localhost:8000/ws" -> "ws://localhost:8000/ws/client_k3j9x0a1b")
    pub base_url: String,

    /// Delay between opening the panel and the first capture cycle
    /// Default: 300ms (absorbs platform adapter setup)
    pub listen_start_delay: Duration,

    /// Delay between the end of playback and the automatic capture restart
    /// Default: 400ms
    pub relisten_delay: Duration,

    /// Preferred voice for replies
    pub voice: VoiceSelector,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "ws://localhost:8000/ws".to_string(),
            listen_start_delay: Duration::from_millis(300),
            relisten_delay: Duration::from_millis(400),
            voice: VoiceSelector::default(),
        }
    }
}

impl SessionConfig {
    /// Transport address for a client identifier
    pub fn address_for(&self, client_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), client_id)
    }
}
