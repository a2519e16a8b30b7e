//! Login against the remote user auth API.
//!
//! A login attempt is a single JSON POST. Every outcome, including transport
//! failures, is folded into an [`AuthResult`] so callers never see a raw error.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::utils::http_helpers::{reason_phrase, status_line};
use crate::utils::value::value_to_string;

pub const LOGIN_FAILED: &str = "User login failed.";
const TIMEOUT_MESSAGE: &str =
    "Login request timed out. Please ensure your network connection is stable and try again.";
const CONNECTION_MESSAGE: &str = "Failed to connect to the authentication server. Please check your network connection and the server status.";

/// Username and password as typed by the user. Never persisted.
#[derive(Serialize, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of one login attempt: exactly one of a role or an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Role(String),
    Error(String),
}

impl AuthResult {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthResult::Role(_))
    }
}

/// Builds the HTTP client used for login requests.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Posts the credentials to `endpoint` and maps the response to an [`AuthResult`].
///
/// A 2xx response whose JSON body carries a `role` field is a successful login.
/// A reachable endpoint that answers without a `role` yields [`LOGIN_FAILED`].
pub async fn authenticate(client: &Client, credentials: &Credentials, endpoint: &str) -> AuthResult {
    debug!("Sending login request for user '{}'", credentials.username);

    let response = match client.post(endpoint).json(credentials).send().await {
        Ok(r) => r,
        Err(e) => return failure(e),
    };
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let reason = reason_phrase(&response);
        let message = format!(
            "HTTP error occurred: {}",
            status_line(status, reason.as_deref())
        );
        error!("HTTPError - {}", message);
        return AuthResult::Error(message);
    }
    let body: Value = match response.json().await {
        Ok(v) => v,
        Err(e) => return failure(e),
    };

    match body.get("role") {
        Some(role) => {
            let role = value_to_string(role.clone());
            info!("User '{}' logged in with role '{}'", credentials.username, role);
            AuthResult::Role(role)
        }
        None => {
            info!("Login rejected for user '{}'", credentials.username);
            AuthResult::Error(LOGIN_FAILED.to_string())
        }
    }
}

fn failure(e: reqwest::Error) -> AuthResult {
    if e.is_timeout() {
        error!("Timeout - {}", TIMEOUT_MESSAGE);
        return AuthResult::Error(TIMEOUT_MESSAGE.to_string());
    }
    if e.is_connect() {
        error!("ConnectionError - {}", CONNECTION_MESSAGE);
        return AuthResult::Error(CONNECTION_MESSAGE.to_string());
    }
    let message = format!("An unexpected error occurred: {}", e);
    error!("Error - {}", message);
    AuthResult::Error(message)
}
