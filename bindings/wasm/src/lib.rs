//! Browser bindings for the embedlink frame bridge.
//!
//! Implements the transport traits over `window` and `<iframe>` and exposes
//! a `StoreEmbed` class to JavaScript. Token minting is deliberately absent:
//! signing secrets never belong in a browser bundle.

mod convert;
mod embed;
mod error;
mod frame;
mod window;

pub use embed::{read_initial_params, StoreEmbed};
pub use frame::IframeHost;
pub use window::{WebTarget, WebWindow};
