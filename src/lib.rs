pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod session;
pub mod transport;

pub use capture::{
    CaptureAvailability, CaptureBackendFactory, CaptureErrorKind, CaptureEvent, CaptureSource,
    LineCapture, SpeechCapture, UnsupportedCapture,
};
pub use config::Config;
pub use error::AssistantError;
pub use http::{create_router, AppState};
pub use playback::{
    select_voice, ConsolePlayback, PlaybackEvent, SpeechParams, SpeechPlayback, Voice,
    VoiceSelector,
};
pub use session::{
    Capabilities, ClientIdGenerator, ConnectionStatus, ControllerEvent, ControllerHandle,
    ConversationController, EventSink, Intent, Origin, Phase, QueuedEvent, RandomClientIds,
    SessionConfig, SessionSnapshot, Subscription, Timer,
};
pub use transport::{
    InboundMessage, Transport, TransportEvent, VoiceInputMessage, WebSocketTransport,
};
