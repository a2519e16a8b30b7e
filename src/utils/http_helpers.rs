use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }
}

/// Converts our `HTTPError` into a JSON error response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (
            self.status,
            [("Content-Type", "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Returns the `<status code> - <reason phrase>` pair used in user facing HTTP error messages.
///
/// `reason` is the phrase the server sent, if any; the canonical phrase for
/// the status is used otherwise.
pub fn status_line(status: StatusCode, reason: Option<&str>) -> String {
    let reason = reason
        .filter(|r| !r.is_empty())
        .or_else(|| status.canonical_reason())
        .unwrap_or("Unknown Status");
    format!("{} - {}", status.as_u16(), reason)
}

/// The reason phrase of an HTTP/1 response, when it differs from the canonical one.
pub fn reason_phrase(response: &reqwest::Response) -> Option<String> {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
}
