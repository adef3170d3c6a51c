pub mod backend;
pub mod line;

pub use backend::{
    CaptureAvailability, CaptureBackendFactory, CaptureErrorKind, CaptureEvent, CaptureSource,
    SpeechCapture, UnsupportedCapture,
};
pub use line::LineCapture;
