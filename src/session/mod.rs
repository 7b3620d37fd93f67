//! Session Management Module
//!
//! Stateless sessions: a signed credential in the `session` cookie, and the
//! short-lived `oauth_state` cookie used while a sign-in is in flight.
//!
//! # Modules
//!
//! - [`codec`] - HS256 session credential encoding and verification
//! - [`cookie`] - Cookie construction and removal
//! - [`manager`] - Request-level glue between cookies and codecs

pub mod codec;
pub mod cookie;
pub mod manager;

// Re-export commonly used items for convenience
pub use codec::{SessionClaims, SessionCodec, SessionError};
pub use cookie::{CookieFactory, CookieOptions, OAUTH_STATE_COOKIE, SESSION_COOKIE};
pub use manager::{SessionManager, StartedFlow};
