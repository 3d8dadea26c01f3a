use embedlink_token::InsecureContext;

/// Errors that can occur while calling the session API.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Called from a browser-like context. There is no override.
    #[error(transparent)]
    InsecureContext(#[from] InsecureContext),

    /// The API key is empty.
    #[error("api key must not be empty")]
    EmptyApiKey,

    /// The configured endpoint is not a valid URL.
    #[error("invalid session api url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The HTTP client could not be built or the request failed in transit.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("session api returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
