//! Parent-side bridge to an embedded storefront iframe.
//!
//! The bridge builds the iframe's initial URL (parent origin, signed token,
//! serialized unsafe params), listens for messages from the store's origin,
//! dispatches typed [`StoreEvent`]s to caller handlers, and posts parameter
//! updates and session reloads back into the iframe.
//!
//! Parameters travel in the URL exactly once. After [`FrameBridge::navigate`]
//! they are only ever sent as `UNSAFE_PARAMS_CHANGE` messages.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and never blocks.

pub mod bridge;
pub mod config;
pub mod error;
pub mod listener;
pub mod message;
pub mod params;
pub mod protocol;
pub mod session;

pub use bridge::{
    BridgeHandlers, CallbackHandler, Delivery, FrameBridge, InstalledChangeHandler,
    PathChangeHandler,
};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use listener::ListenerGuard;
pub use message::{CallbackEvent, HostMessage, StoreEvent, UnsafeParams};
pub use params::{
    build_frame_url, check_unsafe_params, InitialParams, PARENT_DOMAIN_KEY, RESERVED_KEYS,
    SESSION_ID_KEY, TOKEN_KEY,
};
pub use protocol::{Classification, ProtocolVersion};
pub use session::{FrameSession, SessionPhase};
