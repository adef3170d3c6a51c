pub mod backend;
pub mod console;

pub use backend::{select_voice, PlaybackEvent, SpeechParams, SpeechPlayback, Voice, VoiceSelector};
pub use console::ConsolePlayback;
