use reqwest::StatusCode;
use thiserror::Error;

/// Shown whenever the service gave us nothing better to say.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to perform search";

#[derive(Debug, Error)]
pub enum SearchError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Server { status: StatusCode, detail: String },

    /// Non-success status whose body had no usable `detail`.
    #[error("server returned {status} without a readable error body")]
    ServerUnparseable { status: StatusCode },

    /// Success status, but the body is not `{answer, sources}`.
    #[error("malformed search response: {0}")]
    MalformedResponse(String),
}

impl SearchError {
    /// The single string the user gets to see.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Server { detail, .. } => detail.clone(),
            SearchError::Network(_)
            | SearchError::ServerUnparseable { .. }
            | SearchError::MalformedResponse(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
