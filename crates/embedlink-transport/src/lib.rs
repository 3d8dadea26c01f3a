//! Cross-frame message transport abstraction.
//!
//! Provides a unified interface over the pieces of a browser page that the
//! frame bridge talks to:
//! - a window-level message event source (listener registration)
//! - a message target (a window or an iframe's content window)
//! - an iframe element (navigation target + content window)
//!
//! This is the lowest layer of embedlink. The in-memory implementations in
//! [`local`] back native hosts and tests; `embedlink-wasm` backs a real page.

pub mod error;
pub mod local;
pub mod origin;
pub mod traits;

pub use error::{Result, TransportError};
pub use local::{LocalFrame, LocalWindow, RecordingTarget};
pub use origin::Origin;
pub use traits::{FrameHost, InboundMessage, ListenerId, MessageHandler, MessageSource, MessageTarget};
