use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::claims::{check_payload, strip_reserved, Payload, EXP, IAT, NBF};
use crate::clock::{Clock, SystemClock};
use crate::config::CodecConfig;
use crate::context::SigningContext;
use crate::error::{Result, TokenError};
use crate::secret::Secret;

type HmacSha256 = Hmac<Sha256>;

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// A successfully verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    /// Caller payload with registered claims removed.
    pub payload: Payload,
    /// `iat`, unix seconds.
    pub issued_at: u64,
    /// Effective expiry: the earlier of `exp` and `iat + validity`.
    pub expires_at: u64,
}

/// Mints and verifies tokens for one secret.
///
/// # Errors
///
/// Verification distinguishes a bad signature ([`TokenError::InvalidSignature`],
/// kind `Authentication`) from an expired token ([`TokenError::Expired`], kind
/// `Expired`). Expiry is only reported for correctly signed tokens.
#[derive(Debug, Clone)]
pub struct TokenCodec<C = SystemClock> {
    secret: Secret,
    config: CodecConfig,
    clock: C,
}

impl TokenCodec<SystemClock> {
    /// Create a codec with default config and the wall clock.
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            config: CodecConfig::default(),
            clock: SystemClock,
        }
    }
}

impl<C: Clock> TokenCodec<C> {
    /// Replace the clock.
    pub fn with_clock<D: Clock>(self, clock: D) -> TokenCodec<D> {
        TokenCodec {
            secret: self.secret,
            config: self.config,
            clock,
        }
    }

    /// Override codec config.
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Sign `payload` into a token valid for the configured window.
    pub fn sign(&self, payload: &Payload, context: &SigningContext) -> Result<String> {
        context.check("token signing")?;
        self.ensure_secret()?;
        check_payload(payload)?;

        let issued_at = self.clock.now();
        let expires_at = issued_at.saturating_add(self.config.validity.as_secs());

        let mut claims = payload.clone();
        claims.insert(IAT.to_string(), Value::from(issued_at));
        claims.insert(EXP.to_string(), Value::from(expires_at));

        let header = serde_json::to_vec(&Header::hs256()).map_err(TokenError::Serialize)?;
        let claims = serde_json::to_vec(&claims).map_err(TokenError::Serialize)?;

        let mut token = URL_SAFE_NO_PAD.encode(header);
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(claims));

        let mut mac = self.mac()?;
        mac.update(token.as_bytes());
        let signature = mac.finalize().into_bytes();
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(signature));

        debug!(keys = payload.len(), expires_at, "signed token");
        Ok(token)
    }

    /// Verify a raw token and return its payload.
    pub fn verify(&self, token: &str) -> Result<Payload> {
        self.verify_claims(token).map(|verified| verified.payload)
    }

    /// Verify a raw token and return payload and timing claims.
    pub fn verify_claims(&self, token: &str) -> Result<VerifiedToken> {
        self.ensure_secret()?;

        let mut segments = token.split('.');
        let (header_b64, claims_b64, signature_b64) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(header), Some(claims), Some(signature), None) => (header, claims, signature),
            _ => {
                return Err(TokenError::Malformed(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Payload = decode_segment(claims_b64, "claims")?;
        let now = self.clock.now();
        let tolerance = self.config.clock_tolerance.as_secs();

        let expires_at = numeric_claim(&claims, EXP)?
            .ok_or_else(|| TokenError::Malformed("missing exp claim".to_string()))?;
        if now >= expires_at.saturating_add(tolerance) {
            return Err(TokenError::Expired {
                expired_at: expires_at,
            });
        }

        if let Some(not_before) = numeric_claim(&claims, NBF)? {
            if now.saturating_add(tolerance) < not_before {
                return Err(TokenError::NotYetValid { not_before });
            }
        }

        let issued_at = numeric_claim(&claims, IAT)?
            .ok_or_else(|| TokenError::Malformed("missing iat claim".to_string()))?;
        let max_age_end = issued_at.saturating_add(self.config.validity.as_secs());
        if now >= max_age_end.saturating_add(tolerance) {
            return Err(TokenError::Expired {
                expired_at: max_age_end,
            });
        }

        Ok(VerifiedToken {
            payload: strip_reserved(claims),
            issued_at,
            expires_at: expires_at.min(max_age_end),
        })
    }

    /// Sign `payload` and put the token into `base_url` as the token query
    /// parameter. An existing parameter of the same name is replaced.
    pub fn create_link(
        &self,
        base_url: &str,
        payload: &Payload,
        context: &SigningContext,
    ) -> Result<String> {
        let mut url = Url::parse(base_url).map_err(|source| TokenError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let token = self.sign(payload, context)?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != self.config.token_param.as_str())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &retained {
                query.append_pair(key, value);
            }
            query.append_pair(&self.config.token_param, &token);
        }

        Ok(url.into())
    }

    /// Verify a magic link (or a raw token) and return its payload.
    pub fn decode_link(&self, url_or_token: &str) -> Result<Payload> {
        let token = self.extract_token(url_or_token)?;
        self.verify(&token)
    }

    /// Pull the token out of a magic link. Input that is not an absolute URL
    /// is returned as-is and treated as a raw token.
    pub fn extract_token(&self, url_or_token: &str) -> Result<String> {
        let input = url_or_token.trim();
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => return Ok(input.to_string()),
            Err(source) => {
                return Err(TokenError::InvalidUrl {
                    url: input.to_string(),
                    source,
                })
            }
        };

        url.query_pairs()
            .find(|(key, value)| key == self.config.token_param.as_str() && !value.is_empty())
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| TokenError::MissingToken {
                param: self.config.token_param.clone(),
            })
    }

    fn ensure_secret(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(())
    }

    fn mac(&self) -> Result<HmacSha256> {
        // HMAC accepts keys of any length; only an empty key is refused, above.
        HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| TokenError::EmptySecret)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| TokenError::Malformed(format!("{what} is not base64url: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| TokenError::Malformed(format!("{what} is not a JSON object: {err}")))
}

fn numeric_claim(claims: &Payload, name: &str) -> Result<Option<u64>> {
    match claims.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| TokenError::Malformed(format!("{name} claim is not a timestamp"))),
    }
}
