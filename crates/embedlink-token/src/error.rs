use crate::context::InsecureContext;

/// Errors that can occur while minting or verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The payload uses a registered claim name.
    #[error("payload key '{0}' is a reserved claim")]
    ReservedClaim(String),

    /// The signing secret is empty.
    #[error("secret must not be empty")]
    EmptySecret,

    /// The payload could not be serialized.
    #[error("payload is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Minting was attempted in a browser-like context.
    #[error(transparent)]
    InsecureContext(#[from] InsecureContext),

    /// The signature does not match the secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is not a well-formed signed token.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token header names an algorithm other than HS256.
    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// The token's `nbf` is in the future.
    #[error("token not valid before {not_before}")]
    NotYetValid { not_before: u64 },

    /// The token's `exp` has passed, or it is older than the validity window.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: u64 },

    /// The URL has no token query parameter.
    #[error("no '{param}' query parameter in url")]
    MissingToken { param: String },

    /// The URL could not be parsed.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Caller-facing classification of [`TokenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller bug in the input (reserved key, empty secret). Never retry.
    Validation,
    /// Secret-handling call made client-side. Fatal; do not swallow.
    Environment,
    /// Bad signature or unusable token. Ask for a fresh link.
    Authentication,
    /// Token past its validity window. Ask for a fresh link.
    Expired,
    /// No token where one was expected. Ask for a fresh link.
    MalformedInput,
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::ReservedClaim(_) | TokenError::EmptySecret | TokenError::Serialize(_) => {
                ErrorKind::Validation
            }
            TokenError::InsecureContext(_) => ErrorKind::Environment,
            TokenError::InvalidSignature
            | TokenError::Malformed(_)
            | TokenError::UnsupportedAlgorithm(_)
            | TokenError::NotYetValid { .. } => ErrorKind::Authentication,
            TokenError::Expired { .. } => ErrorKind::Expired,
            TokenError::MissingToken { .. } | TokenError::InvalidUrl { .. } => {
                ErrorKind::MalformedInput
            }
        }
    }

    /// True for errors that mean "this link is no longer usable".
    pub fn is_link_invalid(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Authentication | ErrorKind::Expired | ErrorKind::MalformedInput
        )
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
