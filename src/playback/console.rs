// Console playback: "speaks" an utterance by writing it out at speaking pace

use anyhow::Result;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{select_voice, PlaybackEvent, SpeechParams, SpeechPlayback, Voice, VoiceSelector};
use crate::session::EventSink;

/// Speech playback on the terminal
///
/// Words are written to stdout one at a time, paced by `words_per_minute`
/// scaled by the speech rate.
pub struct ConsolePlayback {
    voices: Vec<Voice>,
    params: SpeechParams,
    words_per_minute: u32,
    current: Option<JoinHandle<()>>,
    speaking: Arc<AtomicBool>,
}

impl ConsolePlayback {
    pub fn new(voices: Vec<Voice>, params: SpeechParams, words_per_minute: u32) -> Self {
        info!(
            "Console playback initialized ({} voices, rate {:.1})",
            voices.len(),
            params.rate
        );

        Self {
            voices,
            params,
            words_per_minute,
            current: None,
            speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Time spent on each word
    pub fn word_interval(&self) -> Duration {
        let rate = if self.params.rate > 0.0 {
            self.params.rate as f64
        } else {
            1.0
        };
        let wpm = self.words_per_minute.max(1) as f64;
        Duration::from_secs_f64(60.0 / (wpm * rate))
    }

    /// Voice and prosody an utterance is rendered with, e.g.
    /// `Google UK English Male (rate 1.2, pitch 0.7, volume 1.0)`
    pub fn describe_voice(&self, voice: &VoiceSelector) -> String {
        let name = select_voice(&self.voices, voice)
            .map(|selected| selected.name.as_str())
            .unwrap_or("default");
        format!(
            "{} (rate {:.1}, pitch {:.1}, volume {:.1})",
            name, self.params.rate, self.params.pitch, self.params.volume
        )
    }

    fn abort_current(&mut self) -> bool {
        let was_speaking = self.speaking.swap(false, Ordering::SeqCst);
        if let Some(task) = self.current.take() {
            task.abort();
        }
        was_speaking
    }
}

#[async_trait::async_trait]
impl SpeechPlayback for ConsolePlayback {
    async fn speak(
        &mut self,
        text: &str,
        voice: &VoiceSelector,
        events: EventSink<PlaybackEvent>,
    ) -> Result<()> {
        if self.abort_current() {
            debug!("Cancelled previous utterance");
        }

        let description = self.describe_voice(voice);
        info!(
            "Speaking {} words with voice {}",
            text.split_whitespace().count(),
            description
        );

        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let interval = self.word_interval();
        let speaking = Arc::clone(&self.speaking);
        speaking.store(true, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "[{}]", description);
            for word in &words {
                let _ = write!(stdout, " {}", word);
                let _ = stdout.flush();
                tokio::time::sleep(interval).await;
            }
            let _ = writeln!(stdout);

            if speaking.swap(false, Ordering::SeqCst) {
                events.emit(PlaybackEvent::Ended);
            }
        });

        self.current = Some(task);

        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        if self.abort_current() {
            info!("Playback cancelled");
        }
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "console"
    }
}

impl Drop for ConsolePlayback {
    fn drop(&mut self) {
        self.abort_current();
    }
}
