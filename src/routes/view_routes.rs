//! Interactive site: every request becomes one or more controller events
//! against the caller's session, answered with the freshly rendered page.

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::Credentials;
use crate::controller::Event;
use crate::render::render_document;
use crate::session::View;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

pub const SESSION_COOKIE: &str = "session_id";

/// Registers the page, login, logout and view selection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/view", post(select_view))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct ViewForm {
    view: String,
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(&state, &headers, vec![Event::Refresh]).await
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = Credentials::new(form.username, form.password);
    respond(&state, &headers, vec![Event::LoginSubmitted(credentials)]).await
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(&state, &headers, vec![Event::LogoutRequested]).await
}

async fn select_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ViewForm>,
) -> Result<Response, HTTPError> {
    let view = View::from_key(&form.view).ok_or_else(|| {
        warn!("Unknown view requested: '{}'", form.view);
        HTTPError::new(
            StatusCode::BAD_REQUEST,
            format!("Unknown view '{}'", form.view),
        )
    })?;
    Ok(respond(&state, &headers, vec![Event::ViewSelected(view)]).await)
}

/// Runs `events` against the caller's session and renders the result.
/// A `Set-Cookie` header is attached when a new session was started.
async fn respond(state: &AppState, headers: &HeaderMap, events: Vec<Event>) -> Response {
    let (id, session, created) = state.sessions.get_or_create(session_id(headers)).await;

    let rendered = {
        let mut session = session.lock().await;
        state.controller.dispatch(&mut session, events).await
    };

    let mut response = Html(render_document(&rendered)).into_response();
    if created {
        debug!("Issuing cookie for new session {}", id);
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

/// Reads the session id from the `Cookie` headers, ignoring malformed values.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}
