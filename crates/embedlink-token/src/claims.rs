//! Registered claim names.
//!
//! These keys belong to the token format itself. Callers may not put them in
//! a payload, and they are removed from every verified payload.

use serde_json::{Map, Value};

use crate::error::{Result, TokenError};

/// Caller-defined token payload.
pub type Payload = Map<String, Value>;

/// Issuer.
pub const ISS: &str = "iss";
/// Subject.
pub const SUB: &str = "sub";
/// Audience.
pub const AUD: &str = "aud";
/// Expiration time (unix seconds).
pub const EXP: &str = "exp";
/// Not before (unix seconds).
pub const NBF: &str = "nbf";
/// Issued at (unix seconds).
pub const IAT: &str = "iat";
/// Token id.
pub const JTI: &str = "jti";

/// All registered claim names.
pub const RESERVED_CLAIMS: [&str; 7] = [ISS, SUB, AUD, EXP, NBF, IAT, JTI];

/// Returns true if `key` is a registered claim name.
pub fn is_reserved_claim(key: &str) -> bool {
    matches!(key, ISS | SUB | AUD | EXP | NBF | IAT | JTI)
}

/// Reject a payload that uses any registered claim name.
pub fn check_payload(payload: &Payload) -> Result<()> {
    match payload.keys().find(|key| is_reserved_claim(key)) {
        Some(key) => Err(TokenError::ReservedClaim(key.clone())),
        None => Ok(()),
    }
}

/// Remove every registered claim from a decoded claim set.
pub fn strip_reserved(mut claims: Payload) -> Payload {
    for key in RESERVED_CLAIMS {
        claims.remove(key);
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_registered_claim_is_reserved() {
        for key in RESERVED_CLAIMS {
            assert!(is_reserved_claim(key), "{key} should be reserved");
        }
        assert!(!is_reserved_claim("foo"));
        assert!(!is_reserved_claim("EXP"));
    }

    #[test]
    fn check_payload_names_the_offending_key() {
        let mut payload = Payload::new();
        payload.insert("foo".into(), json!("bar"));
        payload.insert("jti".into(), json!("abc"));

        match check_payload(&payload) {
            Err(TokenError::ReservedClaim(key)) => assert_eq!(key, "jti"),
            other => panic!("expected reserved claim error, got {other:?}"),
        }
    }

    #[test]
    fn strip_reserved_keeps_application_keys() {
        let claims = json!({"foo": "bar", "iat": 1, "exp": 2, "aud": "x"});
        let claims = claims.as_object().cloned().unwrap();

        let stripped = strip_reserved(claims);
        assert_eq!(Value::Object(stripped), json!({"foo": "bar"}));
    }
}
