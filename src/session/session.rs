use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::{EventSink, Subscription};
use crate::playback::PlaybackEvent;
use super::snapshot::SessionSnapshot;

/// Where the conversation is in its turn-taking cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Connecting,
    Listening,
    AwaitingResponse,
    Speaking,
    /// Overlay reported by `SessionSnapshot::effective_phase`; never stored
    ErrorState,
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Listening => "listening",
            Phase::AwaitingResponse => "awaiting response",
            Phase::Speaking => "speaking",
            Phase::ErrorState => "error",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// State of one open assistant panel
///
/// Owned and mutated exclusively by the controller.
pub struct ConversationSession {
    pub phase: Phase,
    pub transcript: String,
    pub auto_listen_enabled: bool,
    pub connection_status: ConnectionStatus,
    pub last_error: Option<String>,
    pub client_id: String,
    pub opened_at: DateTime<Utc>,

    /// A final transcript was already sent in the current capture cycle
    pub sent_this_cycle: bool,

    pub messages_sent: usize,
    pub responses_received: usize,

    /// Current utterance; playback events from any other are stale
    pub utterance: u64,

    /// Adapter registration; released when the session is dropped
    pub(crate) subscription: Subscription,
}

impl ConversationSession {
    pub(crate) fn new(client_id: String, subscription: Subscription) -> Self {
        Self {
            phase: Phase::Connecting,
            transcript: String::new(),
            auto_listen_enabled: true,
            connection_status: ConnectionStatus::Disconnected,
            last_error: None,
            client_id,
            opened_at: Utc::now(),
            sent_this_cycle: false,
            messages_sent: 0,
            responses_received: 0,
            utterance: 0,
            subscription,
        }
    }

    /// Start a new utterance and mint the sink for its playback events
    pub(crate) fn begin_utterance(&mut self) -> EventSink<PlaybackEvent> {
        self.utterance += 1;
        self.subscription.utterance_sink(self.utterance)
    }

    /// Retire the current utterance, if any
    pub(crate) fn end_utterance(&mut self) {
        self.utterance += 1;
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    pub fn snapshot(&self, capture_available: bool) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            transcript: self.transcript.clone(),
            connection_status: self.connection_status,
            last_error: self.last_error.clone(),
            auto_listen_enabled: self.auto_listen_enabled,
            capture_available,
            client_id: Some(self.client_id.clone()),
            opened_at: Some(self.opened_at),
            messages_sent: self.messages_sent,
            responses_received: self.responses_received,
        }
    }
}
