use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope type: store path changed (current protocol).
pub const STORE_PATH_CHANGED: &str = "STORE_PATH_CHANGED";
/// Envelope type: store path changed (legacy protocol).
pub const STORE_PATH_CHANGE: &str = "STORE_PATH_CHANGE";
/// Envelope type: callback action raised by the store.
pub const CALLBACK: &str = "CALLBACK";
/// Envelope type: listing installed state changed.
pub const SET_INSTALLED: &str = "SET_INSTALLED";
/// Envelope type: unsafe parameters changed.
pub const UNSAFE_PARAMS_CHANGE: &str = "UNSAFE_PARAMS_CHANGE";
/// Envelope type: session reload.
pub const SESSION_RELOAD: &str = "SESSION_RELOAD";

/// Unvalidated parameters passed into the store. The store must not trust
/// them.
pub type UnsafeParams = Map<String, Value>;

/// Message posted from the host page into the iframe.
///
/// Both protocol versions use the same outbound shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "UNSAFE_PARAMS_CHANGE")]
    UnsafeParamsChange { params: UnsafeParams },
    #[serde(rename = "SESSION_RELOAD")]
    SessionReload,
}

impl HostMessage {
    pub fn envelope_type(&self) -> &'static str {
        match self {
            HostMessage::UnsafeParamsChange { .. } => UNSAFE_PARAMS_CHANGE,
            HostMessage::SessionReload => SESSION_RELOAD,
        }
    }
}

/// A callback action raised by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    /// Action name. Carried as `actionIdentifier` (or `action` in the legacy
    /// protocol).
    pub action_identifier: String,
    /// Opaque action payload; `Null` when absent.
    pub payload: Value,
}

/// A recognized inbound message from the iframe.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The store navigated to a new path.
    PathChanged { path: String },
    /// The store raised a callback action. A returned value is sent back.
    Callback(CallbackEvent),
    /// A listing was installed or uninstalled.
    SetInstalled { listing_id: String, installed: bool },
    /// The store echoed a parameter change.
    ParamsAcknowledged { params: UnsafeParams },
    /// The store echoed a session reload.
    SessionReloaded,
}

impl StoreEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::PathChanged { .. } => "path_changed",
            StoreEvent::Callback(_) => "callback",
            StoreEvent::SetInstalled { .. } => "set_installed",
            StoreEvent::ParamsAcknowledged { .. } => "params_acknowledged",
            StoreEvent::SessionReloaded => "session_reloaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_messages_serialize_as_tagged_envelopes() {
        let mut params = UnsafeParams::new();
        params.insert("userId".into(), json!("u-1"));

        let update = serde_json::to_value(HostMessage::UnsafeParamsChange { params }).unwrap();
        assert_eq!(
            update,
            json!({"type": "UNSAFE_PARAMS_CHANGE", "params": {"userId": "u-1"}})
        );

        let reload = serde_json::to_value(HostMessage::SessionReload).unwrap();
        assert_eq!(reload, json!({"type": "SESSION_RELOAD"}));
        assert_eq!(HostMessage::SessionReload.envelope_type(), SESSION_RELOAD);
    }
}
