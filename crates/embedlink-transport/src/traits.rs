use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::origin::Origin;

/// Something a message can be posted to: a window, or an iframe's content
/// window.
///
/// Posting is fire-and-forget. The platform delivers the message only if the
/// target's current origin equals `target_origin`.
pub trait MessageTarget {
    fn post_message(&self, data: &Value, target_origin: &Origin) -> Result<()>;
}

/// A message event received by a window.
#[derive(Clone)]
pub struct InboundMessage {
    /// Origin of the sender as reported by the platform.
    pub origin: String,
    /// Structured-cloned message body.
    pub data: Value,
    /// The sending window, when the platform exposes one.
    pub source: Option<Rc<dyn MessageTarget>>,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
            source: None,
        }
    }

    /// Attach the sending window so the receiver can reply.
    pub fn with_source(mut self, source: Rc<dyn MessageTarget>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundMessage")
            .field("origin", &self.origin)
            .field("data", &self.data)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Callback registered on a [`MessageSource`].
pub type MessageHandler = Rc<dyn Fn(&InboundMessage)>;

/// Handle returned by [`MessageSource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A window-level `message` event source.
pub trait MessageSource {
    /// Register a handler. Every registration gets a fresh id.
    fn add_listener(&self, handler: MessageHandler) -> ListenerId;

    /// Remove a handler. Returns false if the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// An iframe element hosting the embedded page.
pub trait FrameHost {
    /// Point the iframe at a new URL.
    fn set_src(&self, url: &str) -> Result<()>;

    /// The iframe's content window.
    ///
    /// Fails with [`TransportError::FrameDetached`](crate::TransportError::FrameDetached)
    /// or [`TransportError::ContentWindowUnavailable`](crate::TransportError::ContentWindowUnavailable)
    /// when the frame is not ready.
    fn content_window(&self) -> Result<Rc<dyn MessageTarget>>;
}
