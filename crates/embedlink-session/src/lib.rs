//! Server-side client for the store session API.
//!
//! Sessions let a backend hand the store an opaque `sessionId` instead of
//! putting user data in the iframe URL. The client creates, updates and
//! revokes sessions with one HTTP request each, authenticated by an API key.
//!
//! Like token minting, every call refuses to run in a browser-like
//! [`embedlink_token::ExecutionContext`].

pub mod client;
pub mod config;
pub mod error;
pub mod params;

pub use client::{SessionClient, SessionRequest, SessionResponse};
pub use config::{AuthStyle, SessionClientConfig, UpdateMethod, DEFAULT_API_URL};
pub use error::{Result, SessionError};
pub use params::{AcceptableParameters, CreateSession, Purchase};
