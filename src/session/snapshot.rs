use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{ConnectionStatus, Phase};

/// Read-only view of the session handed to the UI projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Structural phase
    pub phase: Phase,

    /// Current best-effort recognized text
    pub transcript: String,

    /// Transport connection status
    pub connection_status: ConnectionStatus,

    /// Human-readable description of the last surfaced error
    pub last_error: Option<String>,

    /// Whether capture restarts automatically after playback
    pub auto_listen_enabled: bool,

    /// Whether the platform can capture speech at all
    pub capture_available: bool,

    /// Identifier addressing the transport endpoint, while a session is open
    pub client_id: Option<String>,

    /// When the current session was opened
    pub opened_at: Option<DateTime<Utc>>,

    /// Final transcripts sent to the assistant this session
    pub messages_sent: usize,

    /// Replies received from the assistant this session
    pub responses_received: usize,
}

impl SessionSnapshot {
    /// Snapshot when no session exists
    pub fn without_session(phase: Phase, capture_available: bool) -> Self {
        Self {
            phase,
            transcript: String::new(),
            connection_status: ConnectionStatus::Disconnected,
            last_error: None,
            auto_listen_enabled: true,
            capture_available,
            client_id: None,
            opened_at: None,
            messages_sent: 0,
            responses_received: 0,
        }
    }

    /// Phase with the error overlay applied
    pub fn effective_phase(&self) -> Phase {
        if self.last_error.is_some() {
            Phase::ErrorState
        } else {
            self.phase
        }
    }

    /// Whether a session is open
    pub fn is_open(&self) -> bool {
        self.client_id.is_some()
    }
}
