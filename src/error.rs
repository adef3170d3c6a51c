use thiserror::Error;

use crate::capture::CaptureErrorKind;

/// Failures surfaced to the user through the session's `last_error`.
///
/// The `Display` text of each variant is what the panel renders. None of
/// these tear a session down; recovery is always an explicit retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistantError {
    /// The platform has no speech-to-text capability
    #[error("Speech recognition is not supported on this platform.")]
    CaptureUnsupported,

    /// A capture cycle failed
    #[error("{}", capture_message(.0))]
    Capture(CaptureErrorKind),

    /// Starting a capture cycle failed outright
    #[error("Could not start mic.")]
    MicStart,

    /// The transport could not be established
    #[error("Failed to connect to assistant service")]
    TransportConnect,

    /// The transport reported an error on a live connection
    #[error("Connection error occurred")]
    TransportError,

    /// The transport closed with a code other than normal closure
    #[error("Connection lost")]
    TransportAbnormalClose(u16),
}

impl AssistantError {
    /// Whether this error should populate `last_error`
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, AssistantError::Capture(CaptureErrorKind::NoSpeech))
    }
}

fn capture_message(kind: &CaptureErrorKind) -> String {
    match kind {
        CaptureErrorKind::Unsupported => AssistantError::CaptureUnsupported.to_string(),
        CaptureErrorKind::NoSpeech => "No speech detected".to_string(),
        CaptureErrorKind::Network => "Voice recognition failed to connect.".to_string(),
        CaptureErrorKind::Other(reason) => format!("Speech recognition error: {}", reason),
    }
}
