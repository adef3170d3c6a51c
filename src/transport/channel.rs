use anyhow::Result;

use super::messages::{InboundMessage, VoiceInputMessage};
use crate::session::EventSink;

/// Close code for a normal, intentional closure
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when no status was present in the close frame
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the connection dropped without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Events emitted by the transport channel
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(InboundMessage),
    /// The channel could not be established
    ConnectFailed(String),
    /// Error on an established channel
    Error(String),
    Closed { code: u16 },
}

impl TransportEvent {
    pub fn is_abnormal_close(&self) -> bool {
        matches!(self, TransportEvent::Closed { code } if *code != NORMAL_CLOSURE)
    }
}

/// Duplex message channel to the assistant service
///
/// `open` returns once the connection attempt is under way; the outcome
/// arrives as `Opened` or `ConnectFailed`.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Open a channel to `address`, replacing any existing one
    async fn open(&mut self, address: &str, events: EventSink<TransportEvent>) -> Result<()>;

    /// Transmit one message
    async fn send(&mut self, message: &VoiceInputMessage) -> Result<()>;

    /// Close gracefully; idempotent, and a no-op if never opened.
    ///
    /// No events are delivered from a channel after it is closed locally.
    async fn close(&mut self) -> Result<()>;

    /// Check if a channel exists (connecting or open)
    fn is_open(&self) -> bool;

    /// Get transport name for logging
    fn name(&self) -> &str;
}
