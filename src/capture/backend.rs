use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::EventSink;

/// Why a capture cycle failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureErrorKind {
    /// Platform has no speech-to-text capability
    Unsupported,
    /// Cycle ended without any recognizable speech
    NoSpeech,
    /// Recognition service unreachable
    Network,
    /// Anything else the platform reports
    Other(String),
}

/// Events emitted during a capture cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Started,
    Ended,
    /// Best-effort text so far; exactly one final result closes a cycle
    Result { text: String, is_final: bool },
    Error(CaptureErrorKind),
}

/// Whether the platform can capture speech at all.
///
/// Detected once, when the adapter is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureAvailability {
    Available,
    Unsupported,
}

/// Speech-to-text capture trait
///
/// Implementations:
/// - Line capture: one line of text per cycle from stdin or any reader
/// - Unsupported: stands in when the platform has no capability
#[async_trait::async_trait]
pub trait SpeechCapture: Send {
    /// Availability detected at construction
    fn availability(&self) -> CaptureAvailability;

    /// Begin one capture cycle
    ///
    /// A no-op while a cycle is already active; never yields two cycles.
    async fn start(&mut self, events: EventSink<CaptureEvent>) -> Result<()>;

    /// End the active cycle; a no-op when idle
    async fn stop(&mut self) -> Result<()>;

    /// Check if a cycle is currently active
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Stand-in for platforms without speech capture
pub struct UnsupportedCapture;

#[async_trait::async_trait]
impl SpeechCapture for UnsupportedCapture {
    fn availability(&self) -> CaptureAvailability {
        CaptureAvailability::Unsupported
    }

    async fn start(&mut self, _events: EventSink<CaptureEvent>) -> Result<()> {
        anyhow::bail!("Speech capture is not supported on this platform")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

/// Capture source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// One typed line per utterance on stdin
    Stdin,
    /// No capture capability
    None,
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create a capture backend for the configured source
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(source: CaptureSource) -> Box<dyn SpeechCapture> {
        match source {
            CaptureSource::Stdin => Box::new(super::line::LineCapture::stdin()),
            CaptureSource::None => Box::new(UnsupportedCapture),
        }
    }
}
