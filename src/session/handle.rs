use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, watch};

use super::events::{ControllerEvent, Intent, QueuedEvent};
use super::snapshot::SessionSnapshot;

/// Cloneable handle to a running conversation controller
#[derive(Clone)]
pub struct ControllerHandle {
    events: mpsc::UnboundedSender<QueuedEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl ControllerHandle {
    pub fn new(
        events: mpsc::UnboundedSender<QueuedEvent>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { events, snapshots }
    }

    /// Forward a user intent to the controller
    pub fn send(&self, intent: Intent) -> Result<()> {
        self.events
            .send(intent.into())
            .map_err(|_| anyhow!("Conversation controller has stopped"))
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Close any open session and stop the event loop
    pub fn shutdown(&self) -> Result<()> {
        self.events
            .send(ControllerEvent::Shutdown.into())
            .map_err(|_| anyhow!("Conversation controller has stopped"))
    }

    /// Resolves once the event loop has exited
    pub async fn stopped(&self) {
        self.events.closed().await
    }

    pub fn is_running(&self) -> bool {
        !self.events.is_closed()
    }
}
