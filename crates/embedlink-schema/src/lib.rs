//! Optional JSON Schema validation of cross-frame envelopes.
//!
//! Envelopes are JSON objects discriminated by a string `type` field. The
//! [`EnvelopeRegistry`] maps each type to a compiled JSON Schema (2020-12)
//! and checks inbound envelopes before they are dispatched. Schemas for the
//! built-in protocol versions ship with the crate; more can be loaded from a
//! directory of `<type>.schema.json` files.

pub mod builtin;
pub mod config;
pub mod error;
pub mod registry;
pub mod validator;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::{envelope_type, EnvelopeRegistry};
