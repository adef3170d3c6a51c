//! Conversation session management
//!
//! This module provides the `ConversationController` that coordinates:
//! - Speech capture cycles (listening)
//! - The duplex transport to the assistant service
//! - Speech playback of replies
//! - Turn-taking, auto-listen and error surfacing
//!
//! All adapter callbacks, user intents and timers arrive as
//! [`ControllerEvent`]s on one queue and are processed one at a time.

mod config;
mod controller;
mod events;
mod handle;
mod ids;
mod session;
mod snapshot;

pub use config::SessionConfig;
pub use controller::{Capabilities, ConversationController};
pub use events::{ControllerEvent, EventSink, Intent, Origin, QueuedEvent, Subscription, Timer};
pub use handle::ControllerHandle;
pub use ids::{ClientIdGenerator, RandomClientIds};
pub use session::{ConnectionStatus, ConversationSession, Phase};
pub use snapshot::SessionSnapshot;
