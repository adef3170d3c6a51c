pub mod channel;
pub mod client;
pub mod messages;

pub use channel::{Transport, TransportEvent, ABNORMAL_CLOSURE, NORMAL_CLOSURE, NO_STATUS_RECEIVED};
pub use client::WebSocketTransport;
pub use messages::{encode_voice_input, parse_inbound, InboundMessage, VoiceInputMessage};
