use crate::session::ControllerHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Controller of the assistant session
    pub controller: ControllerHandle,
}

impl AppState {
    pub fn new(controller: ControllerHandle) -> Self {
        Self { controller }
    }
}
