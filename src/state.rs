//! Shared application state.
//!
//! Contains the state that is shared across all request handlers: the
//! controller (which owns the resolved config) and the live sessions.

use crate::controller::Controller;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Sequences login, navigation and data retrieval for a session.
    pub controller: Arc<Controller>,
    /// Every live session, keyed by cookie id.
    pub sessions: Arc<SessionRegistry>,
}
