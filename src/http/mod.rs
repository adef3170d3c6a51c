//! HTTP API for the assistant panel
//!
//! The UI projection renders snapshots and forwards intents through:
//! - GET /assistant - Current session snapshot
//! - POST /assistant/open - Open the panel (new session)
//! - POST /assistant/close - Close the panel
//! - POST /assistant/reconnect - Reopen the transport under a fresh identity
//! - POST /assistant/mic/start - Manual mic start
//! - POST /assistant/mic/stop - Manual mic stop
//! - POST /assistant/speech/stop - Stop the assistant speaking
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
