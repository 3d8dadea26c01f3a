//! Magic link tokens and a cross-frame bridge for embedded storefronts.
//!
//! A backend mints a short-lived signed link with [`token`]; the embedding
//! page mounts a [`bridge::FrameBridge`] that opens the store in an iframe and
//! talks to it over `postMessage`.
//!
//! # Crate Structure
//!
//! - [`transport`]: cross-frame messaging traits and in-memory implementations
//! - [`token`]: HS256 magic link tokens
//! - [`bridge`]: the parent-side iframe bridge
//! - [`schema`]: optional envelope validation (behind `schema` feature)
//! - [`session`]: server-side session API client (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use embedlink_transport::*;
}

/// Re-export token types.
pub mod token {
    pub use embedlink_token::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use embedlink_bridge::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use embedlink_schema::*;
}

/// Re-export session client types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use embedlink_session::*;
}

pub use embedlink_token::{create_magic_link, decode_magic_link};
