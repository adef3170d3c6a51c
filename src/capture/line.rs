// Line-based capture: each capture cycle consumes one line of typed text

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{CaptureAvailability, CaptureErrorKind, CaptureEvent, SpeechCapture};
use crate::session::EventSink;

/// Speech capture fed by lines of text
///
/// A reader task forwards lines for the adapter's lifetime, so no input is
/// lost between cycles. Each cycle emits growing interim results one word
/// at a time, then a single final result.
pub struct LineCapture {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
    reader_task: JoinHandle<()>,
    cycle_task: Option<JoinHandle<()>>,
    capturing: Arc<AtomicBool>,
    events: Option<EventSink<CaptureEvent>>,
}

impl LineCapture {
    /// Capture from the process's standard input
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);

        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read capture input: {}", e);
                        break;
                    }
                }
            }
            debug!("Capture input closed");
        });

        Self {
            lines: Arc::new(Mutex::new(rx)),
            reader_task,
            cycle_task: None,
            capturing: Arc::new(AtomicBool::new(false)),
            events: None,
        }
    }

    async fn run_cycle(
        lines: Arc<Mutex<mpsc::Receiver<String>>>,
        capturing: Arc<AtomicBool>,
        events: EventSink<CaptureEvent>,
    ) {
        let next = {
            let mut rx = lines.lock().await;
            rx.recv().await
        };

        match next {
            Some(line) => {
                let words: Vec<&str> = line.split_whitespace().collect();
                if words.is_empty() {
                    events.emit(CaptureEvent::Error(CaptureErrorKind::NoSpeech));
                } else {
                    for n in 1..words.len() {
                        events.emit(CaptureEvent::Result {
                            text: words[..n].join(" "),
                            is_final: false,
                        });
                    }
                    events.emit(CaptureEvent::Result {
                        text: words.join(" "),
                        is_final: true,
                    });
                }
            }
            None => {
                events.emit(CaptureEvent::Error(CaptureErrorKind::Other(
                    "input closed".to_string(),
                )));
            }
        }

        if capturing.swap(false, Ordering::SeqCst) {
            events.emit(CaptureEvent::Ended);
        }
    }
}

#[async_trait::async_trait]
impl SpeechCapture for LineCapture {
    fn availability(&self) -> CaptureAvailability {
        CaptureAvailability::Available
    }

    async fn start(&mut self, events: EventSink<CaptureEvent>) -> Result<()> {
        if self.capturing.load(Ordering::SeqCst) {
            debug!("Capture cycle already active");
            return Ok(());
        }

        info!("Starting capture cycle");

        self.capturing.store(true, Ordering::SeqCst);
        events.emit(CaptureEvent::Started);

        let task = tokio::spawn(Self::run_cycle(
            Arc::clone(&self.lines),
            Arc::clone(&self.capturing),
            events.clone(),
        ));

        self.cycle_task = Some(task);
        self.events = Some(events);

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.cycle_task.take() {
            task.abort();
        }

        if self.capturing.swap(false, Ordering::SeqCst) {
            info!("Capture cycle stopped");
            if let Some(events) = &self.events {
                events.emit(CaptureEvent::Ended);
            }
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "line capture"
    }
}

impl Drop for LineCapture {
    fn drop(&mut self) {
        if let Some(task) = self.cycle_task.take() {
            task.abort();
        }
        self.reader_task.abort();
    }
}
