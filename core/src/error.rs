//! Error types for the Yupdates client.
//!
//! # Design
//! Every failure a caller can observe is one `ApiError` variant, so calling
//! code can branch on the kind (for example, re-prompt for a token on
//! `Authorization` but surface `Server` as an outage). HTTP-level variants
//! carry the status code and whatever message the server put in the body.

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The token or base URL is missing or empty. Raised before any request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request failed below the HTTP layer: DNS, connection refused,
    /// timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned 401 or 403.
    #[error("authorization rejected (HTTP {status}){}", detail(.message))]
    Authorization { status: u16, message: Option<String> },

    /// The server returned a 4xx other than 401/403.
    #[error("request rejected (HTTP {status}){}", detail(.message))]
    ClientRequest { status: u16, message: Option<String> },

    /// The server returned a 5xx.
    #[error("server error (HTTP {status}){}", detail(.message))]
    Server { status: u16, message: Option<String> },

    /// The status code is outside every range this client recognizes.
    #[error("unexpected HTTP status {status}")]
    Unexpected { status: u16, body: String },

    /// A 200 response whose body is not JSON or lacks required fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Caller input rejected before any request was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status code for errors that came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authorization { status, .. }
            | ApiError::ClientRequest { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::Unexpected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}
