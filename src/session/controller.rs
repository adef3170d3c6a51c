use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::events::{ControllerEvent, Intent, Origin, QueuedEvent, Subscription, Timer};
use super::handle::ControllerHandle;
use super::ids::ClientIdGenerator;
use super::session::{ConnectionStatus, ConversationSession, Phase};
use super::snapshot::SessionSnapshot;
use crate::capture::{CaptureAvailability, CaptureErrorKind, CaptureEvent, SpeechCapture};
use crate::error::AssistantError;
use crate::playback::{PlaybackEvent, SpeechPlayback};
use crate::transport::{Transport, TransportEvent, VoiceInputMessage, NORMAL_CLOSURE};

/// Platform capabilities injected into the controller
pub struct Capabilities {
    pub capture: Box<dyn SpeechCapture>,
    pub playback: Box<dyn SpeechPlayback>,
    pub transport: Box<dyn Transport>,
    pub client_ids: Box<dyn ClientIdGenerator>,
}

/// Turn-taking state machine for the voice assistant
///
/// Consumes one [`ControllerEvent`] at a time, in arrival order, and is the
/// only writer of the session record. Adapter failures are translated into
/// `last_error`; none of them close the session.
pub struct ConversationController {
    config: SessionConfig,
    capture: Box<dyn SpeechCapture>,
    playback: Box<dyn SpeechPlayback>,
    transport: Box<dyn Transport>,
    client_ids: Box<dyn ClientIdGenerator>,

    capture_available: bool,

    /// Capture absence not yet reported to a session
    capture_notice_pending: bool,

    session: Option<ConversationSession>,

    /// Phase reported while no session exists
    resting_phase: Phase,

    events_tx: mpsc::UnboundedSender<QueuedEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl ConversationController {
    /// Create a controller and the queue it consumes
    pub fn new(
        config: SessionConfig,
        capabilities: Capabilities,
    ) -> (Self, mpsc::UnboundedReceiver<QueuedEvent>) {
        let capture_available =
            capabilities.capture.availability() == CaptureAvailability::Available;
        if !capture_available {
            warn!(
                "Speech capture unavailable ({}); capture features disabled",
                capabilities.capture.name()
            );
        }

        info!(
            "Conversation controller ready (capture: {}, playback: {}, transport: {})",
            capabilities.capture.name(),
            capabilities.playback.name(),
            capabilities.transport.name()
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(SessionSnapshot::without_session(
            Phase::Idle,
            capture_available,
        ));

        let controller = Self {
            config,
            capture: capabilities.capture,
            playback: capabilities.playback,
            transport: capabilities.transport,
            client_ids: capabilities.client_ids,
            capture_available,
            capture_notice_pending: !capture_available,
            session: None,
            resting_phase: Phase::Idle,
            events_tx,
            snapshots,
        };

        (controller, events_rx)
    }

    /// Spawn the event loop and return a handle to it
    pub fn spawn(config: SessionConfig, capabilities: Capabilities) -> ControllerHandle {
        let (controller, events) = Self::new(config, capabilities);
        let handle = ControllerHandle::new(controller.sender(), controller.subscribe());
        tokio::spawn(controller.run(events));
        handle
    }

    /// Process events until shutdown
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<QueuedEvent>) {
        info!("Conversation controller started");

        while let Some(event) = events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }

        info!("Conversation controller stopped");
    }

    /// Sender feeding this controller's queue
    pub fn sender(&self) -> mpsc::UnboundedSender<QueuedEvent> {
        self.events_tx.clone()
    }

    /// Snapshot updates, published after every processed event
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.session {
            Some(session) => session.snapshot(self.capture_available),
            None => SessionSnapshot::without_session(self.resting_phase, self.capture_available),
        }
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.session.as_ref()
    }

    /// Process one event to completion.
    ///
    /// Events from a session or utterance that is no longer current are
    /// dropped. Returns false once the controller has shut down.
    pub async fn handle(&mut self, queued: QueuedEvent) -> bool {
        let QueuedEvent { origin, event } = queued;

        if let Some(origin) = origin {
            if !self.is_current(origin) {
                debug!("Dropping stale event {:?} from {:?}", event, origin);
                return true;
            }
        }

        let running = match event {
            ControllerEvent::Intent(intent) => {
                self.on_intent(intent).await;
                true
            }
            ControllerEvent::Capture(event) => {
                self.on_capture(event).await;
                true
            }
            ControllerEvent::Playback(event) => {
                self.on_playback(event);
                true
            }
            ControllerEvent::Transport(event) => {
                self.on_transport(event).await;
                true
            }
            ControllerEvent::Timer(timer) => {
                self.on_timer(timer).await;
                true
            }
            ControllerEvent::Shutdown => {
                info!("Shutting down conversation controller");
                self.close().await;
                false
            }
        };

        self.publish();
        running
    }

    fn is_current(&self, origin: Origin) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        if session.subscription.generation() != origin.session {
            return false;
        }
        match origin.utterance {
            Some(utterance) => utterance == session.utterance,
            None => true,
        }
    }

    async fn on_intent(&mut self, intent: Intent) {
        debug!("Intent: {:?}", intent);

        match intent {
            Intent::Open => self.open().await,
            Intent::Close => self.close().await,
            Intent::StartMic => {
                let Some(session) = self.session.as_mut() else {
                    debug!("Ignoring mic start without a session");
                    return;
                };
                session.last_error = None;
                session.auto_listen_enabled = true;
                if let Err(e) =
                    begin_capture(self.capture.as_mut(), session, self.capture_available).await
                {
                    session.last_error = Some(e.to_string());
                }
            }
            Intent::StopMic => {
                if let Some(session) = self.session.as_mut() {
                    session.auto_listen_enabled = false;
                    if session.phase == Phase::Listening {
                        session.phase = Phase::Idle;
                    }
                }
                if let Err(e) = self.capture.stop().await {
                    warn!("Failed to stop capture: {:#}", e);
                }
            }
            Intent::StopSpeaking => {
                if let Err(e) = self.playback.cancel().await {
                    warn!("Failed to cancel playback: {:#}", e);
                }
                if let Some(session) = self.session.as_mut() {
                    session.end_utterance();
                    session.auto_listen_enabled = false;
                    if matches!(session.phase, Phase::Speaking | Phase::Listening) {
                        session.phase = Phase::Idle;
                    }
                }
                if let Err(e) = self.capture.stop().await {
                    warn!("Failed to stop capture: {:#}", e);
                }
            }
            Intent::Reconnect => self.reconnect().await,
        }
    }

    async fn open(&mut self) {
        if self.session.is_some() {
            debug!("Assistant session already open");
            return;
        }

        let client_id = self.client_ids.next_id();
        let subscription = Subscription::new(self.events_tx.clone());
        let mut session = ConversationSession::new(client_id, subscription);

        info!("Opening assistant session {}", session.client_id);

        let address = self.config.address_for(&session.client_id);
        if let Err(e) = self
            .transport
            .open(&address, session.subscription.sink())
            .await
        {
            error!("Failed to open transport: {:#}", e);
            session.last_error = Some(AssistantError::TransportConnect.to_string());
        }

        if self.capture_available {
            schedule(
                &session.subscription,
                Timer::ListenStart,
                self.config.listen_start_delay,
            );
        } else if self.capture_notice_pending {
            self.capture_notice_pending = false;
            session
                .last_error
                .get_or_insert_with(|| AssistantError::CaptureUnsupported.to_string());
        }

        self.session = Some(session);
    }

    async fn close(&mut self) {
        // Dropping the session releases its subscription before teardown,
        // so events triggered by the teardown itself are never delivered.
        if let Some(session) = self.session.take() {
            info!("Closing assistant session {}", session.client_id);
        }

        if let Err(e) = self.playback.cancel().await {
            warn!("Failed to cancel playback: {:#}", e);
        }
        if let Err(e) = self.capture.stop().await {
            warn!("Failed to stop capture: {:#}", e);
        }
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport: {:#}", e);
        }

        self.resting_phase = Phase::Closed;
    }

    async fn reconnect(&mut self) {
        let Some(session) = self.session.as_mut() else {
            warn!("Reconnect requested without an open session");
            return;
        };

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport: {:#}", e);
        }

        session.last_error = None;
        session.connection_status = ConnectionStatus::Disconnected;
        session.client_id = self.client_ids.next_id();
        if matches!(session.phase, Phase::Idle | Phase::AwaitingResponse) {
            session.phase = Phase::Connecting;
        }

        info!("Reconnecting assistant session as {}", session.client_id);

        let address = self.config.address_for(&session.client_id);
        if let Err(e) = self
            .transport
            .open(&address, session.subscription.sink())
            .await
        {
            error!("Failed to open transport: {:#}", e);
            session.last_error = Some(AssistantError::TransportConnect.to_string());
            if session.phase == Phase::Connecting {
                session.phase = Phase::Idle;
            }
        }
    }

    async fn on_capture(&mut self, event: CaptureEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("Ignoring capture event without a session: {:?}", event);
            return;
        };

        match event {
            CaptureEvent::Started => {
                session.sent_this_cycle = false;
                session.last_error = None;
                session.phase = Phase::Listening;
            }
            CaptureEvent::Ended => {
                if session.phase == Phase::Listening {
                    session.phase = Phase::Idle;
                }
            }
            CaptureEvent::Result { text, is_final } => {
                session.transcript = text;
                if !is_final {
                    return;
                }

                let message = session.transcript.trim();
                if message.is_empty() || !session.is_connected() {
                    debug!("Discarding final transcript (empty or not connected)");
                    return;
                }
                if session.sent_this_cycle {
                    debug!("Final transcript already sent this cycle");
                    return;
                }

                let outbound = VoiceInputMessage::new(message);
                match self.transport.send(&outbound).await {
                    Ok(()) => {
                        info!("Sent voice input ({} chars)", outbound.message.len());
                        session.sent_this_cycle = true;
                        session.messages_sent += 1;
                        session.phase = Phase::AwaitingResponse;
                    }
                    Err(e) => {
                        error!("Failed to send voice input: {:#}", e);
                        session.last_error = Some(AssistantError::TransportError.to_string());
                    }
                }
            }
            CaptureEvent::Error(kind) => {
                if kind == CaptureErrorKind::Unsupported {
                    self.capture_available = false;
                }

                let error = AssistantError::Capture(kind);
                if error.is_user_visible() {
                    warn!("Capture error: {}", error);
                    session.last_error = Some(error.to_string());
                } else {
                    debug!("No speech detected");
                }

                if let Err(e) = self.capture.stop().await {
                    warn!("Failed to stop capture: {:#}", e);
                }
            }
        }
    }

    fn on_playback(&mut self, event: PlaybackEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("Ignoring playback event without a session: {:?}", event);
            return;
        };

        match event {
            PlaybackEvent::Ended => {
                if session.phase == Phase::Speaking {
                    session.phase = Phase::Idle;
                }
                if session.auto_listen_enabled && self.capture_available {
                    schedule(
                        &session.subscription,
                        Timer::Relisten,
                        self.config.relisten_delay,
                    );
                }
            }
            PlaybackEvent::Error(reason) => {
                warn!("Playback error: {}", reason);
                if session.phase == Phase::Speaking {
                    session.phase = Phase::Idle;
                }
            }
        }
    }

    async fn on_transport(&mut self, event: TransportEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("Ignoring transport event without a session: {:?}", event);
            return;
        };

        match event {
            TransportEvent::Opened => {
                session.connection_status = ConnectionStatus::Connected;
                session.last_error = None;
                if session.phase == Phase::Connecting {
                    session.phase = if self.capture.is_capturing() {
                        Phase::Listening
                    } else {
                        Phase::Idle
                    };
                }
            }
            TransportEvent::Message(inbound) => {
                session.responses_received += 1;

                if let Err(e) = self.playback.cancel().await {
                    warn!("Failed to cancel playback: {:#}", e);
                }
                session.end_utterance();

                let text = inbound.response_text.trim();
                if text.is_empty() {
                    debug!("Empty reply; nothing to speak");
                    if session.phase == Phase::AwaitingResponse {
                        session.phase = Phase::Idle;
                    }
                    return;
                }

                if self.capture.is_capturing() {
                    if let Err(e) = self.capture.stop().await {
                        warn!("Failed to stop capture: {:#}", e);
                    }
                }

                let events = session.begin_utterance();
                match self
                    .playback
                    .speak(text, &self.config.voice, events)
                    .await
                {
                    Ok(()) => session.phase = Phase::Speaking,
                    Err(e) => {
                        error!("Failed to start playback: {:#}", e);
                        session.phase = Phase::Idle;
                    }
                }
            }
            TransportEvent::ConnectFailed(reason) => {
                warn!("Transport connect failed: {}", reason);
                session.connection_status = ConnectionStatus::Disconnected;
                session.last_error = Some(AssistantError::TransportConnect.to_string());
                if session.phase == Phase::Connecting {
                    session.phase = Phase::Idle;
                }
            }
            TransportEvent::Error(reason) => {
                warn!("Transport error: {}", reason);
                session.connection_status = ConnectionStatus::Disconnected;
                session.last_error = Some(AssistantError::TransportError.to_string());
            }
            TransportEvent::Closed { code } => {
                session.connection_status = ConnectionStatus::Disconnected;
                if code != NORMAL_CLOSURE {
                    warn!("Transport closed abnormally (code={})", code);
                    session.last_error =
                        Some(AssistantError::TransportAbnormalClose(code).to_string());
                } else {
                    info!("Transport closed");
                }
            }
        }
    }

    async fn on_timer(&mut self, timer: Timer) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if !session.auto_listen_enabled {
            debug!("{:?} skipped: auto-listen disabled", timer);
            return;
        }
        if self.playback.is_speaking() || self.capture.is_capturing() {
            debug!("{:?} skipped: capture or playback active", timer);
            return;
        }
        if matches!(session.phase, Phase::AwaitingResponse | Phase::Speaking) {
            debug!("{:?} skipped: {}", timer, session.phase);
            return;
        }

        if let Err(e) = begin_capture(self.capture.as_mut(), session, self.capture_available).await
        {
            session.last_error = Some(e.to_string());
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            if current.phase != snapshot.phase {
                info!("Phase: {} -> {}", current.phase, snapshot.phase);
            }
            *current = snapshot;
            true
        });
    }
}

/// Start one capture cycle for the session
async fn begin_capture(
    capture: &mut dyn SpeechCapture,
    session: &mut ConversationSession,
    capture_available: bool,
) -> Result<(), AssistantError> {
    if !capture_available {
        return Err(AssistantError::CaptureUnsupported);
    }

    if !capture.is_capturing() {
        capture
            .start(session.subscription.sink())
            .await
            .map_err(|e| {
                error!("Failed to start capture: {:#}", e);
                AssistantError::MicStart
            })?;
        session.sent_this_cycle = false;
    }

    session.phase = Phase::Listening;
    Ok(())
}

/// Emit `timer` through the session's subscription after `delay`
fn schedule(subscription: &Subscription, timer: Timer, delay: Duration) {
    let events = subscription.sink::<Timer>();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        events.emit(timer);
    });
}
