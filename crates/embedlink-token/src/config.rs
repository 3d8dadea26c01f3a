use std::time::Duration;

/// Default validity window of a minted token.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Query parameter carrying the token in a magic link.
pub const DEFAULT_TOKEN_PARAM: &str = "token";

/// Controls token minting and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Lifetime of a minted token. Also the maximum accepted age (from
    /// `iat`) on verification, whatever `exp` a token claims.
    pub validity: Duration,
    /// Allowed clock skew when checking `exp`, `nbf` and the maximum age.
    pub clock_tolerance: Duration,
    /// Query parameter name used in magic links.
    pub token_param: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            validity: DEFAULT_VALIDITY,
            clock_tolerance: Duration::ZERO,
            token_param: DEFAULT_TOKEN_PARAM.to_string(),
        }
    }
}
