/// Errors that can occur in bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// An unsafe parameter uses a key reserved by the protocol.
    #[error("key '{0}' is reserved and cannot be used in unsafe params")]
    ReservedKey(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] embedlink_transport::TransportError),

    /// A URL could not be parsed.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// A query parameter in an iframe URL could not be decoded.
    #[error("query parameter '{key}' could not be decoded: {reason}")]
    InvalidParam { key: String, reason: String },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bridge was unmounted.
    #[error("bridge is unmounted")]
    Unmounted,

    /// Schema validation error.
    #[cfg(feature = "schema")]
    #[error("schema validation error: {0}")]
    Schema(#[from] embedlink_schema::SchemaError),
}

impl BridgeError {
    /// True when the iframe or its content window was missing.
    pub fn is_target_not_ready(&self) -> bool {
        matches!(self, BridgeError::Transport(err) if err.is_not_ready())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
