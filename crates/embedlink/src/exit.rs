use std::fmt;
use std::io;

use embedlink_bridge::BridgeError;
use embedlink_schema::SchemaError;
use embedlink_session::SessionError;
use embedlink_token::{ErrorKind, TokenError};
use embedlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
/// A well-formed, correctly signed link whose validity window has passed.
pub const EXPIRED: i32 = 51;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut => TIMEOUT,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn token_error(context: &str, err: TokenError) -> CliError {
    let code = match err.kind() {
        ErrorKind::Validation => USAGE,
        ErrorKind::Environment => INTERNAL,
        ErrorKind::Authentication => PERMISSION_DENIED,
        ErrorKind::Expired => EXPIRED,
        ErrorKind::MalformedInput => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidUrl { .. } | TransportError::OpaqueOrigin(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Transport(err) => transport_error(context, err),
        BridgeError::ReservedKey(_) | BridgeError::InvalidUrl { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        BridgeError::InvalidParam { .. } | BridgeError::Json(_) | BridgeError::Schema(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) | SchemaError::CompileFailed { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    let code = match &err {
        SessionError::InsecureContext(_) => INTERNAL,
        SessionError::EmptyApiKey | SessionError::InvalidUrl { .. } => USAGE,
        SessionError::Http(http) if http.is_timeout() => TIMEOUT,
        SessionError::Http(http) if http.is_connect() => TRANSPORT_ERROR,
        SessionError::Http(_) => FAILURE,
        SessionError::Status { status: 401 | 403, .. } => PERMISSION_DENIED,
        SessionError::Status { .. } => FAILURE,
        SessionError::Json(_) => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kinds_map_to_distinct_codes() {
        assert_eq!(token_error("x", TokenError::EmptySecret).code, USAGE);
        assert_eq!(token_error("x", TokenError::InvalidSignature).code, PERMISSION_DENIED);
        assert_eq!(
            token_error("x", TokenError::Expired { expired_at: 1 }).code,
            EXPIRED
        );
        assert_eq!(
            token_error(
                "x",
                TokenError::MissingToken {
                    param: "token".into()
                }
            )
            .code,
            DATA_INVALID
        );
    }

    #[test]
    fn session_status_codes() {
        let denied = SessionError::Status {
            status: 403,
            body: String::new(),
        };
        assert_eq!(session_error("x", denied).code, PERMISSION_DENIED);

        let broken = SessionError::Status {
            status: 502,
            body: String::new(),
        };
        let err = session_error("session create failed", broken);
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("session create failed: "));
    }

    #[test]
    fn reserved_key_is_a_usage_error() {
        let err = bridge_error("x", BridgeError::ReservedKey("token".into()));
        assert_eq!(err.code, USAGE);
    }
}
