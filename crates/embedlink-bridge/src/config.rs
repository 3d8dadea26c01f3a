use std::fmt;

use crate::message::UnsafeParams;
use crate::protocol::ProtocolVersion;

/// Everything needed to mount a bridge and build the iframe's initial URL.
#[derive(Clone, PartialEq)]
pub struct BridgeConfig {
    /// Store URL. Its origin gates every inbound message.
    pub target_url: String,
    /// Origin of the embedding page, sent as `parentDomain`.
    pub parent_origin: Option<String>,
    /// Signed magic link token, sent as `token` on first load only.
    pub token: Option<String>,
    /// Existing store session, sent as `sessionId`.
    pub session_id: Option<String>,
    /// Store page to open; the path becomes `/p={page}{path}`.
    pub page: Option<String>,
    /// Listing to open; the path becomes `/l/{listing_id}`.
    pub listing_id: Option<String>,
    /// Unvalidated parameters for the store.
    pub unsafe_params: UnsafeParams,
    /// Dialect spoken by the store.
    pub protocol: ProtocolVersion,
}

impl BridgeConfig {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            parent_origin: None,
            token: None,
            session_id: None,
            page: None,
            listing_id: None,
            unsafe_params: UnsafeParams::new(),
            protocol: ProtocolVersion::default(),
        }
    }

    pub fn with_parent_origin(mut self, origin: impl Into<String>) -> Self {
        self.parent_origin = Some(origin.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_listing_id(mut self, listing_id: impl Into<String>) -> Self {
        self.listing_id = Some(listing_id.into());
        self
    }

    pub fn with_unsafe_params(mut self, params: UnsafeParams) -> Self {
        self.unsafe_params = params;
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("BridgeConfig");
        dbg.field("target_url", &self.target_url)
            .field("parent_origin", &self.parent_origin);
        match &self.token {
            Some(token) => dbg.field("token", &format_args!("<redacted:{} bytes>", token.len())),
            None => dbg.field("token", &Option::<String>::None),
        };
        dbg.field("session_id", &self.session_id)
            .field("page", &self.page)
            .field("listing_id", &self.listing_id)
            .field("unsafe_params", &self.unsafe_params.keys().collect::<Vec<_>>())
            .field("protocol", &self.protocol)
            .finish()
    }
}
