//! Wire protocol versions.
//!
//! The store speaks one of two dialects. They share the outbound envelopes
//! and differ in the path-change type name, the callback action field, and
//! the query key prefix used for unsafe params. A version recognizes only its
//! own names.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::message::{
    CallbackEvent, StoreEvent, UnsafeParams, CALLBACK, SESSION_RELOAD, SET_INSTALLED,
    STORE_PATH_CHANGE, STORE_PATH_CHANGED, UNSAFE_PARAMS_CHANGE,
};

/// Protocol dialect spoken by the embedded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    /// `STORE_PATH_CHANGE`, `CALLBACK {action}`, unprefixed query keys.
    Legacy,
    /// `STORE_PATH_CHANGED`, `CALLBACK {actionIdentifier}`, `$`-prefixed
    /// query keys.
    #[default]
    V1,
}

/// Outcome of classifying an inbound message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A recognized, well-formed event.
    Event(StoreEvent),
    /// Not an object, no string `type`, or a type this version does not use.
    Unrecognized { envelope_type: Option<String> },
    /// A recognized type whose body does not match its shape.
    Malformed {
        envelope_type: String,
        reason: String,
    },
}

impl ProtocolVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::Legacy => "legacy",
            ProtocolVersion::V1 => "v1",
        }
    }

    /// Envelope type the store uses to report a path change.
    pub fn path_changed_type(self) -> &'static str {
        match self {
            ProtocolVersion::Legacy => STORE_PATH_CHANGE,
            ProtocolVersion::V1 => STORE_PATH_CHANGED,
        }
    }

    /// Prefix applied to unsafe param names in the iframe query.
    pub fn param_prefix(self) -> &'static str {
        match self {
            ProtocolVersion::Legacy => "",
            ProtocolVersion::V1 => "$",
        }
    }

    /// Inbound envelope types this version recognizes.
    pub fn inbound_types(self) -> [&'static str; 5] {
        [
            self.path_changed_type(),
            CALLBACK,
            SET_INSTALLED,
            UNSAFE_PARAMS_CHANGE,
            SESSION_RELOAD,
        ]
    }

    /// Classify a message body by its `type` field.
    pub fn classify(self, data: &Value) -> Classification {
        let envelope_type = match data.get("type").and_then(Value::as_str) {
            Some(envelope_type) if self.inbound_types().iter().any(|t| *t == envelope_type) => {
                envelope_type
            }
            other => {
                return Classification::Unrecognized {
                    envelope_type: other.map(str::to_string),
                }
            }
        };

        let decoded = match self {
            ProtocolVersion::V1 => V1Envelope::deserialize(data).map(StoreEvent::from),
            ProtocolVersion::Legacy => LegacyEnvelope::deserialize(data).map(StoreEvent::from),
        };
        match decoded {
            Ok(event) => Classification::Event(event),
            Err(err) => Classification::Malformed {
                envelope_type: envelope_type.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(ProtocolVersion::Legacy),
            "v1" => Ok(ProtocolVersion::V1),
            other => Err(format!("unknown protocol version '{other}' (expected v1 or legacy)")),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum V1Envelope {
    #[serde(rename = "STORE_PATH_CHANGED")]
    PathChanged { path: String },
    #[serde(rename = "CALLBACK")]
    Callback {
        #[serde(rename = "actionIdentifier")]
        action_identifier: String,
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename = "SET_INSTALLED")]
    SetInstalled {
        #[serde(rename = "listingId")]
        listing_id: String,
        installed: bool,
    },
    #[serde(rename = "UNSAFE_PARAMS_CHANGE")]
    ParamsChange { params: UnsafeParams },
    #[serde(rename = "SESSION_RELOAD")]
    SessionReload,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum LegacyEnvelope {
    #[serde(rename = "STORE_PATH_CHANGE")]
    PathChange { path: String },
    #[serde(rename = "CALLBACK")]
    Callback {
        action: String,
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename = "SET_INSTALLED")]
    SetInstalled {
        #[serde(rename = "listingId")]
        listing_id: String,
        installed: bool,
    },
    #[serde(rename = "UNSAFE_PARAMS_CHANGE")]
    ParamsChange { params: UnsafeParams },
    #[serde(rename = "SESSION_RELOAD")]
    SessionReload,
}

impl From<V1Envelope> for StoreEvent {
    fn from(envelope: V1Envelope) -> Self {
        match envelope {
            V1Envelope::PathChanged { path } => StoreEvent::PathChanged { path },
            V1Envelope::Callback {
                action_identifier,
                payload,
            } => StoreEvent::Callback(CallbackEvent {
                action_identifier,
                payload,
            }),
            V1Envelope::SetInstalled {
                listing_id,
                installed,
            } => StoreEvent::SetInstalled {
                listing_id,
                installed,
            },
            V1Envelope::ParamsChange { params } => StoreEvent::ParamsAcknowledged { params },
            V1Envelope::SessionReload => StoreEvent::SessionReloaded,
        }
    }
}

impl From<LegacyEnvelope> for StoreEvent {
    fn from(envelope: LegacyEnvelope) -> Self {
        match envelope {
            LegacyEnvelope::PathChange { path } => StoreEvent::PathChanged { path },
            LegacyEnvelope::Callback { action, payload } => StoreEvent::Callback(CallbackEvent {
                action_identifier: action,
                payload,
            }),
            LegacyEnvelope::SetInstalled {
                listing_id,
                installed,
            } => StoreEvent::SetInstalled {
                listing_id,
                installed,
            },
            LegacyEnvelope::ParamsChange { params } => StoreEvent::ParamsAcknowledged { params },
            LegacyEnvelope::SessionReload => StoreEvent::SessionReloaded,
        }
    }
}
