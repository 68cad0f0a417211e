//! HTTP clients for the bot API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.
//!
//! - [`ActionClient`]: one authenticated request at a time, wrapped in the
//!   transport and server retry layers.
//! - [`EventStream`] / [`read_ndjson`]: persistent and finite NDJSON feeds.
//! - [`BotClient`]: one method per challenge and game lifecycle action.

mod action;
mod bot;
pub mod retry;
mod stream;

pub use action::{ActionClient, ApiRequest, CallOutcome, USER_AGENT};
pub use bot::BotClient;
pub use retry::{Backoff, RetryPolicy, retry};
pub use stream::{EventStream, StreamFault, read_ndjson};

use reqwest::StatusCode;

/// Errors produced by a single API request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a 5xx status.
    #[error("server error: status {status}, body: {body}")]
    Server { status: StatusCode, body: String },

    /// The server refused the request (4xx or any other non-2xx status).
    #[error("request rejected: status {status}, body: {body}")]
    Rejected { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Classify a non-2xx response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_server_error() {
            ClientError::Server { status, body }
        } else {
            ClientError::Rejected { status, body }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::Server { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Server { status, .. } | ClientError::Rejected { status, .. } => {
                Some(*status)
            }
            ClientError::Transport(e) => e.status(),
            ClientError::Json(_) | ClientError::Url(_) => None,
        }
    }
}
