//! One-call helpers over [`TokenCodec`] with default configuration.

use crate::claims::Payload;
use crate::codec::TokenCodec;
use crate::context::SigningContext;
use crate::error::Result;
use crate::secret::Secret;

/// Store embed page used when no base URL is configured.
pub const DEFAULT_EMBED_URL: &str = "https://integrations-captain.com/store-embed";

/// Sign `payload` with `secret` and append the token to `base_url`.
pub fn create_magic_link(
    secret: impl Into<Secret>,
    base_url: &str,
    payload: &Payload,
    context: &SigningContext,
) -> Result<String> {
    TokenCodec::new(secret).create_link(base_url, payload, context)
}

/// Verify a magic link (or a bare token) and return its payload.
pub fn decode_magic_link(secret: impl Into<Secret>, url_or_token: &str) -> Result<Payload> {
    TokenCodec::new(secret).decode_link(url_or_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TokenError};
    use serde_json::json;
    use url::Url;

    fn payload() -> Payload {
        json!({"foo": "bar", "userId": 17})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn magic_link_roundtrip() {
        let link = create_magic_link(
            "hunter2",
            "http://demo.integrations.store",
            &payload(),
            &SigningContext::server(),
        )
        .unwrap();

        let url = Url::parse(&link).unwrap();
        assert_eq!(url.host_str(), Some("demo.integrations.store"));
        assert!(url.query_pairs().any(|(k, _)| k == "token"));

        assert_eq!(decode_magic_link("hunter2", &link).unwrap(), payload());
    }

    #[test]
    fn existing_query_is_kept_and_token_replaced() {
        let link = create_magic_link(
            "hunter2",
            "https://example.test/embed?theme=dark&token=stale",
            &payload(),
            &SigningContext::server(),
        )
        .unwrap();

        let url = Url::parse(&link).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.iter().filter(|(k, _)| k == "token").count(), 1);
        assert!(pairs.contains(&("theme".to_string(), "dark".to_string())));
        assert!(!pairs.contains(&("token".to_string(), "stale".to_string())));
    }

    #[test]
    fn bare_token_is_accepted() {
        let link = create_magic_link(
            "hunter2",
            DEFAULT_EMBED_URL,
            &payload(),
            &SigningContext::server(),
        )
        .unwrap();
        let token = TokenCodec::new("hunter2").extract_token(&link).unwrap();

        assert_eq!(decode_magic_link("hunter2", &token).unwrap(), payload());
    }

    #[test]
    fn url_without_token_is_malformed_input() {
        let err = decode_magic_link("hunter2", "http://demo.integrations.store?someOtherParam=42")
            .unwrap_err();
        assert!(matches!(err, TokenError::MissingToken { ref param } if param == "token"));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = create_magic_link(
            "hunter2",
            "not a url",
            &payload(),
            &SigningContext::server(),
        )
        .unwrap_err();
        assert!(matches!(err, TokenError::InvalidUrl { .. }));
    }

    #[test]
    fn browser_context_refuses_magic_link() {
        let err = create_magic_link(
            "hunter2",
            DEFAULT_EMBED_URL,
            &payload(),
            &SigningContext::browser(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
    }
}
