//! Initial iframe URL construction and its child-side inverse.
//!
//! Every unsafe param value is JSON-serialized, escaped like
//! `encodeURIComponent`, then form-encoded again when written into the query.
//! The parent origin marker is escaped the same way. Stores decode one extra
//! layer, so this double encoding is part of the wire format.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::message::UnsafeParams;
use crate::protocol::ProtocolVersion;

/// Query key carrying the embedding page's origin.
pub const PARENT_DOMAIN_KEY: &str = "parentDomain";
/// Query key carrying the magic link token.
pub const TOKEN_KEY: &str = "token";
/// Query key carrying an existing store session id.
pub const SESSION_ID_KEY: &str = "sessionId";

/// Keys that unsafe params may never use.
pub const RESERVED_KEYS: [&str; 3] = [PARENT_DOMAIN_KEY, TOKEN_KEY, SESSION_ID_KEY];

/// Characters `encodeURIComponent` escapes.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Fail on the first reserved key.
pub fn check_unsafe_params(params: &UnsafeParams) -> Result<()> {
    match params.keys().find(|key| is_reserved_key(key)) {
        Some(key) => Err(BridgeError::ReservedKey(key.clone())),
        None => Ok(()),
    }
}

/// Escape like `encodeURIComponent`.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Reverse [`encode_component`].
pub fn decode_component(input: &str) -> std::result::Result<String, std::str::Utf8Error> {
    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
}

pub(crate) fn parse_url(input: &str) -> Result<Url> {
    Url::parse(input).map_err(|source| BridgeError::InvalidUrl {
        url: input.to_string(),
        source,
    })
}

/// Set `key` the way `URLSearchParams.set` does: the first existing pair
/// takes the value, later duplicates are removed, otherwise append.
pub fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            if k != key {
                return Some((k.into_owned(), v.into_owned()));
            }
            if replaced {
                return None;
            }
            replaced = true;
            Some((k.into_owned(), value.to_string()))
        })
        .collect();

    let mut query = url.query_pairs_mut();
    query.clear();
    for (k, v) in &pairs {
        query.append_pair(k, v);
    }
    if !replaced {
        query.append_pair(key, value);
    }
}

/// Build the iframe's first navigation URL.
pub fn build_frame_url(config: &BridgeConfig) -> Result<Url> {
    check_unsafe_params(&config.unsafe_params)?;
    let mut url = parse_url(&config.target_url)?;

    if let Some(origin) = &config.parent_origin {
        set_query_param(&mut url, PARENT_DOMAIN_KEY, &encode_component(origin));
    }

    let prefix = config.protocol.param_prefix();
    for (key, value) in &config.unsafe_params {
        let json = serde_json::to_string(value)?;
        set_query_param(&mut url, &format!("{prefix}{key}"), &encode_component(&json));
    }

    if let Some(session_id) = &config.session_id {
        set_query_param(&mut url, SESSION_ID_KEY, session_id);
    }
    if let Some(token) = &config.token {
        set_query_param(&mut url, TOKEN_KEY, token);
    }

    if let Some(page) = &config.page {
        let path = format!("/p={page}{}", url.path());
        url.set_path(&path);
    }
    if let Some(listing_id) = &config.listing_id {
        url.set_path(&format!("/l/{listing_id}"));
    }

    Ok(url)
}

/// What an embedded store reads back from its initial URL.
#[derive(Clone, PartialEq, Default)]
pub struct InitialParams {
    pub parent_origin: Option<String>,
    pub token: Option<String>,
    pub session_id: Option<String>,
    pub unsafe_params: UnsafeParams,
}

impl InitialParams {
    /// Decode the query of an iframe URL built by [`build_frame_url`].
    pub fn from_url(input: &str, protocol: ProtocolVersion) -> Result<Self> {
        let url = parse_url(input)?;
        let prefix = protocol.param_prefix();
        let mut params = InitialParams::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARENT_DOMAIN_KEY => {
                    params.parent_origin = Some(decode_param(&key, &value)?);
                }
                TOKEN_KEY => params.token = Some(value.into_owned()),
                SESSION_ID_KEY => params.session_id = Some(value.into_owned()),
                other => {
                    let Some(name) = other.strip_prefix(prefix) else {
                        continue;
                    };
                    if name.is_empty() {
                        continue;
                    }
                    match decode_json_param(&key, &value) {
                        Ok(value) => {
                            params.unsafe_params.insert(name.to_string(), value);
                        }
                        // Unprefixed keys may be the store's own query.
                        Err(err) if protocol == ProtocolVersion::Legacy => {
                            debug!(key = %key, error = %err, "skipping non-param query pair");
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        Ok(params)
    }
}

impl std::fmt::Debug for InitialParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitialParams")
            .field("parent_origin", &self.parent_origin)
            .field(
                "token",
                &self
                    .token
                    .as_ref()
                    .map(|token| format!("<redacted:{} bytes>", token.len())),
            )
            .field("session_id", &self.session_id)
            .field("unsafe_params", &self.unsafe_params)
            .finish()
    }
}

fn decode_param(key: &str, value: &str) -> Result<String> {
    decode_component(value).map_err(|err| BridgeError::InvalidParam {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn decode_json_param(key: &str, value: &str) -> Result<Value> {
    let json = decode_param(key, value)?;
    serde_json::from_str(&json).map_err(|err| BridgeError::InvalidParam {
        key: key.to_string(),
        reason: err.to_string(),
    })
}
