// Deterministic fakes for the capture, playback and transport capabilities
//
// Each fake records the calls the controller makes and keeps the sink it
// was handed, so tests can inject adapter events at will.

#![allow(dead_code)]

use anyhow::{bail, Result};
use folio_voice::transport::{encode_voice_input, parse_inbound};
use folio_voice::{
    Capabilities, CaptureAvailability, CaptureErrorKind, CaptureEvent, ClientIdGenerator,
    ControllerEvent, ConversationController, EventSink, Intent, PlaybackEvent, QueuedEvent,
    SessionConfig,
    SessionSnapshot, SpeechCapture, SpeechPlayback, Transport, TransportEvent, VoiceInputMessage,
    VoiceSelector,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const BASE_URL: &str = "ws://assistant.test/ws";

// ============================================================================
// Capture
// ============================================================================

#[derive(Default)]
pub struct CaptureState {
    pub starts: usize,
    pub stops: usize,
    pub capturing: bool,
    pub events: Option<EventSink<CaptureEvent>>,
}

#[derive(Clone, Default)]
pub struct FakeCapture {
    pub state: Arc<Mutex<CaptureState>>,
    unsupported: bool,
}

impl FakeCapture {
    pub fn unsupported() -> Self {
        Self {
            state: Arc::default(),
            unsupported: true,
        }
    }

    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn capturing(&self) -> bool {
        self.state.lock().unwrap().capturing
    }

    /// Emit through the last sink handed over; false if the sink is dead
    pub fn emit(&self, event: CaptureEvent) -> bool {
        let state = self.state.lock().unwrap();
        match &state.events {
            Some(events) => events.emit(event),
            None => false,
        }
    }

    pub fn say(&self, text: &str, is_final: bool) -> bool {
        self.emit(CaptureEvent::Result {
            text: text.to_string(),
            is_final,
        })
    }

    pub fn fail(&self, kind: CaptureErrorKind) -> bool {
        self.emit(CaptureEvent::Error(kind))
    }

    /// The platform ends the cycle on its own
    pub fn finish(&self) {
        self.state.lock().unwrap().capturing = false;
        self.emit(CaptureEvent::Ended);
    }
}

#[async_trait::async_trait]
impl SpeechCapture for FakeCapture {
    fn availability(&self) -> CaptureAvailability {
        if self.unsupported {
            CaptureAvailability::Unsupported
        } else {
            CaptureAvailability::Available
        }
    }

    async fn start(&mut self, events: EventSink<CaptureEvent>) -> Result<()> {
        if self.unsupported {
            bail!("unsupported");
        }
        let mut state = self.state.lock().unwrap();
        if state.capturing {
            return Ok(());
        }
        state.starts += 1;
        state.capturing = true;
        events.emit(CaptureEvent::Started);
        state.events = Some(events);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        if state.capturing {
            state.capturing = false;
            if let Some(events) = &state.events {
                events.emit(CaptureEvent::Ended);
            }
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing()
    }

    fn name(&self) -> &str {
        "fake capture"
    }
}

// ============================================================================
// Playback
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOp {
    Speak(String),
    Cancel,
}

#[derive(Default)]
pub struct PlaybackState {
    pub ops: Vec<PlaybackOp>,
    pub speaking: bool,
    /// `speak` calls that found an utterance still playing
    pub overlapping_speaks: usize,
    pub voices: Vec<VoiceSelector>,
    pub events: Option<EventSink<PlaybackEvent>>,
}

#[derive(Clone, Default)]
pub struct FakePlayback {
    pub state: Arc<Mutex<PlaybackState>>,
}

impl FakePlayback {
    pub fn ops(&self) -> Vec<PlaybackOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                PlaybackOp::Speak(text) => Some(text),
                PlaybackOp::Cancel => None,
            })
            .collect()
    }

    pub fn speaking(&self) -> bool {
        self.state.lock().unwrap().speaking
    }

    pub fn overlapping_speaks(&self) -> usize {
        self.state.lock().unwrap().overlapping_speaks
    }

    /// The utterance runs to completion
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.speaking = false;
        match &state.events {
            Some(events) => events.emit(PlaybackEvent::Ended),
            None => false,
        }
    }

    pub fn emit(&self, event: PlaybackEvent) -> bool {
        let state = self.state.lock().unwrap();
        match &state.events {
            Some(events) => events.emit(event),
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl SpeechPlayback for FakePlayback {
    async fn speak(
        &mut self,
        text: &str,
        voice: &VoiceSelector,
        events: EventSink<PlaybackEvent>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.speaking {
            state.overlapping_speaks += 1;
        }
        state.ops.push(PlaybackOp::Speak(text.to_string()));
        state.voices.push(voice.clone());
        state.speaking = true;
        state.events = Some(events);
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(PlaybackOp::Cancel);
        state.speaking = false;
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking()
    }

    fn name(&self) -> &str {
        "fake playback"
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Default)]
pub struct TransportState {
    pub addresses: Vec<String>,
    pub wire: Vec<String>,
    pub sent: Vec<VoiceInputMessage>,
    pub closes: usize,
    pub open: bool,
    pub fail_open: bool,
    pub events: Option<EventSink<TransportEvent>>,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    pub state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn addresses(&self) -> Vec<String> {
        self.state.lock().unwrap().addresses.clone()
    }

    pub fn wire(&self) -> Vec<String> {
        self.state.lock().unwrap().wire.clone()
    }

    pub fn sent(&self) -> Vec<VoiceInputMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    pub fn emit(&self, event: TransportEvent) -> bool {
        let state = self.state.lock().unwrap();
        match &state.events {
            Some(events) => events.emit(event),
            None => false,
        }
    }

    pub fn connect(&self) -> bool {
        self.emit(TransportEvent::Opened)
    }

    pub fn deliver(&self, raw: &str) -> bool {
        self.emit(TransportEvent::Message(parse_inbound(raw)))
    }

    /// The server side drops the channel
    pub fn drop_connection(&self, code: u16) -> bool {
        self.state.lock().unwrap().open = false;
        self.emit(TransportEvent::Closed { code })
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn open(&mut self, address: &str, events: EventSink<TransportEvent>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.addresses.push(address.to_string());
        if state.fail_open {
            bail!("refused");
        }
        state.open = true;
        state.events = Some(events);
        Ok(())
    }

    async fn send(&mut self, message: &VoiceInputMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.open {
            bail!("not connected");
        }
        state.wire.push(encode_voice_input(message));
        state.sent.push(message.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closes += 1;
        state.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    fn name(&self) -> &str {
        "fake transport"
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// client_1, client_2, ...
#[derive(Default)]
pub struct SequentialIds {
    next: usize,
}

impl ClientIdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("client_{}", self.next)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn session_config() -> SessionConfig {
    SessionConfig {
        base_url: BASE_URL.to_string(),
        listen_start_delay: Duration::from_millis(300),
        relisten_delay: Duration::from_millis(400),
        voice: VoiceSelector::default(),
    }
}

pub fn capabilities(
    capture: &FakeCapture,
    playback: &FakePlayback,
    transport: &FakeTransport,
) -> Capabilities {
    Capabilities {
        capture: Box::new(capture.clone()),
        playback: Box::new(playback.clone()),
        transport: Box::new(transport.clone()),
        client_ids: Box::new(SequentialIds::default()),
    }
}

/// A controller driven by hand, one event at a time
pub struct Harness {
    pub controller: ConversationController,
    pub events: mpsc::UnboundedReceiver<QueuedEvent>,
    pub capture: FakeCapture,
    pub playback: FakePlayback,
    pub transport: FakeTransport,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_capture(FakeCapture::default())
    }

    pub fn with_capture(capture: FakeCapture) -> Self {
        let playback = FakePlayback::default();
        let transport = FakeTransport::default();
        let (controller, events) = ConversationController::new(
            session_config(),
            capabilities(&capture, &playback, &transport),
        );

        Self {
            controller,
            events,
            capture,
            playback,
            transport,
        }
    }

    pub async fn intent(&mut self, intent: Intent) {
        self.controller.handle(intent.into()).await;
    }

    /// Process every event already queued
    pub async fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.controller.handle(event).await;
        }
    }

    /// Wait for the next event (advancing a paused clock) and process it
    pub async fn next(&mut self) -> ControllerEvent {
        let queued = self.events.recv().await.expect("controller queue closed");
        let event = queued.event.clone();
        self.controller.handle(queued).await;
        event
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    /// Open, connect and let the first capture cycle start
    pub async fn open_connected(&mut self) {
        self.intent(Intent::Open).await;
        self.transport.connect();
        self.drain().await;
        self.next().await;
        self.drain().await;
    }

    /// Send one final transcript and have the assistant reply
    pub async fn exchange(&mut self, said: &str, reply: &str) {
        self.capture.say(said, true);
        self.capture.finish();
        self.drain().await;
        self.transport.deliver(reply);
        self.drain().await;
    }

    /// Nothing is delivered within `window` of (paused) time
    pub async fn assert_quiet_for(&mut self, window: Duration) {
        tokio::time::sleep(window).await;
        assert!(
            self.events.try_recv().is_err(),
            "unexpected controller event"
        );
    }
}
