//! Signed, short-lived magic link tokens.
//!
//! A magic link is a URL carrying a `token` query parameter. The token is a
//! JWT-shaped string signed with HMAC-SHA256:
//! - a base64url header (`{"alg":"HS256","typ":"JWT"}`)
//! - base64url claims: the caller's payload plus `iat` and `exp`
//! - a base64url signature over `header.claims`
//!
//! Payload keys may not use the registered claim names (see [`claims`]).
//! Tokens are valid for a fixed window (one hour by default) and are not
//! tracked after issue; replay prevention is up to the caller.
//!
//! Minting refuses to run in a browser-like [`ExecutionContext`] unless the
//! caller opts out. That check is a guard rail against shipping the secret to
//! a client, not a security boundary: anyone holding the secret can set the
//! flag.

pub mod claims;
pub mod clock;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod link;
pub mod secret;

pub use claims::{is_reserved_claim, Payload, RESERVED_CLAIMS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{TokenCodec, VerifiedToken, ALGORITHM};
pub use config::{CodecConfig, DEFAULT_TOKEN_PARAM, DEFAULT_VALIDITY};
pub use context::{ExecutionContext, InsecureContext, SigningContext};
pub use error::{ErrorKind, Result, TokenError};
pub use link::{create_magic_link, decode_magic_link, DEFAULT_EMBED_URL};
pub use secret::Secret;
