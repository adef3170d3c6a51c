use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::capture::CaptureEvent;
use crate::playback::PlaybackEvent;
use crate::transport::TransportEvent;

/// User intents forwarded by the UI projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Open the assistant panel (creates a session)
    Open,
    /// Close the assistant panel (destroys the session)
    Close,
    /// Manual mic start
    StartMic,
    /// Manual mic stop; disables auto-listen
    StopMic,
    /// Manual stop-speaking; disables auto-listen
    StopSpeaking,
    /// Close the transport if open and reopen it under a fresh identity
    Reconnect,
}

/// Fixed-delay timers owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// First capture cycle after the panel opens
    ListenStart,
    /// Capture restart after playback ends
    Relisten,
}

/// Everything the controller reacts to, in arrival order
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Intent(Intent),
    Capture(CaptureEvent),
    Playback(PlaybackEvent),
    Transport(TransportEvent),
    Timer(Timer),
    /// Close the session and stop the event loop
    Shutdown,
}

impl From<Intent> for ControllerEvent {
    fn from(intent: Intent) -> Self {
        ControllerEvent::Intent(intent)
    }
}

impl From<CaptureEvent> for ControllerEvent {
    fn from(event: CaptureEvent) -> Self {
        ControllerEvent::Capture(event)
    }
}

impl From<PlaybackEvent> for ControllerEvent {
    fn from(event: PlaybackEvent) -> Self {
        ControllerEvent::Playback(event)
    }
}

impl From<TransportEvent> for ControllerEvent {
    fn from(event: TransportEvent) -> Self {
        ControllerEvent::Transport(event)
    }
}

impl From<Timer> for ControllerEvent {
    fn from(timer: Timer) -> Self {
        ControllerEvent::Timer(timer)
    }
}

/// Session generations start at 1 and never repeat within a process
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Which session, and for playback which utterance, emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub session: u64,
    pub utterance: Option<u64>,
}

/// An event on the controller queue.
///
/// Adapter and timer events carry the [`Origin`] of the sink that emitted
/// them; the controller drops those whose origin is no longer current.
/// Intents and shutdown have no origin.
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub origin: Option<Origin>,
    pub event: ControllerEvent,
}

impl From<ControllerEvent> for QueuedEvent {
    fn from(event: ControllerEvent) -> Self {
        Self {
            origin: None,
            event,
        }
    }
}

impl From<Intent> for QueuedEvent {
    fn from(intent: Intent) -> Self {
        ControllerEvent::Intent(intent).into()
    }
}

/// Sending half of the controller queue handed to one adapter.
///
/// A sink stays deliverable only while the [`Subscription`] that minted it
/// is alive; afterwards `emit` silently drops the event. Events sent just
/// before the subscription ends are still stamped with their origin.
pub struct EventSink<E> {
    tx: mpsc::UnboundedSender<QueuedEvent>,
    live: Arc<AtomicBool>,
    origin: Origin,
    _event: PhantomData<fn(E)>,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            live: Arc::clone(&self.live),
            origin: self.origin,
            _event: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("origin", &self.origin)
            .field("live", &self.is_live())
            .finish()
    }
}

impl<E: Into<ControllerEvent>> EventSink<E> {
    /// Deliver an event; returns false if it was dropped
    pub fn emit(&self, event: E) -> bool {
        if !self.is_live() {
            return false;
        }
        self.tx
            .send(QueuedEvent {
                origin: Some(self.origin),
                event: event.into(),
            })
            .is_ok()
    }
}

impl<E> EventSink<E> {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Scoped registration of one session's adapters on the controller queue.
///
/// Released exactly once, when dropped.
pub struct Subscription {
    tx: mpsc::UnboundedSender<QueuedEvent>,
    live: Arc<AtomicBool>,
    generation: u64,
}

impl Subscription {
    pub fn new(tx: mpsc::UnboundedSender<QueuedEvent>) -> Self {
        Self {
            tx,
            live: Arc::new(AtomicBool::new(true)),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Mint a sink bound to this subscription
    pub fn sink<E>(&self) -> EventSink<E> {
        self.mint(None)
    }

    /// Mint a sink bound to one utterance of this subscription
    pub fn utterance_sink<E>(&self, utterance: u64) -> EventSink<E> {
        self.mint(Some(utterance))
    }

    fn mint<E>(&self, utterance: Option<u64>) -> EventSink<E> {
        EventSink {
            tx: self.tx.clone(),
            live: Arc::clone(&self.live),
            origin: Origin {
                session: self.generation,
                utterance,
            },
            _event: PhantomData,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}
