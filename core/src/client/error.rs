//! Typed error for the console API client.

use thiserror::Error;

/// Maximum number of body characters preserved for diagnostics.
pub const BODY_SNIPPET_MAX: usize = 500;

/// Failure classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure: DNS, connection refused, aborted call.
    Network,
    /// The backend answered with a non-success status.
    Server,
    /// The backend answered successfully but the body was not valid JSON.
    Parse,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Parse => "parse",
        };
        f.write_str(s)
    }
}

/// Error raised by [`ApiClient`](crate::client::ApiClient) calls.
///
/// Always carries a message and the request correlation id; `status` is
/// present for server errors only. `body_snippet` holds at most
/// [`BODY_SNIPPET_MAX`] characters of the raw response body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub kind: ErrorKind,
    pub request_id: String,
    pub body_snippet: Option<String>,
}

impl ApiError {
    pub fn server(message: impl Into<String>, status: u16, request_id: &str, body: &str) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            kind: ErrorKind::Server,
            request_id: request_id.to_string(),
            body_snippet: snippet(body),
        }
    }

    pub fn parse(message: impl Into<String>, request_id: &str, body: &str) -> Self {
        Self {
            message: message.into(),
            status: None,
            kind: ErrorKind::Parse,
            request_id: request_id.to_string(),
            body_snippet: snippet(body),
        }
    }

    pub fn network(message: impl Into<String>, request_id: &str) -> Self {
        Self {
            message: message.into(),
            status: None,
            kind: ErrorKind::Network,
            request_id: request_id.to_string(),
            body_snippet: None,
        }
    }
}

fn snippet(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    Some(body.chars().take(BODY_SNIPPET_MAX).collect())
}
