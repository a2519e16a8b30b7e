//! HTTP route definitions and handlers.
//!
//! The interactive site lives in `view_routes`; `health_routes` answers
//! liveness probes.

mod health_routes;
mod view_routes;

use crate::state::AppState;
use axum::Router;

pub use view_routes::SESSION_COOKIE;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(view_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
