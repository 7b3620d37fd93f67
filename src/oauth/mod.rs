//! OAuth authentication module
//!
//! Authorization-code flow against a single identity provider: CSRF state,
//! the provider client, and decoding of the returned identity token.

pub mod identity;
pub mod provider;
pub mod state;

pub use identity::{IdentityClaims, IdentityError};
pub use provider::{
    ExchangeError, HttpTokenExchange, OAuthProvider, TokenExchange, TokenRequest, TokenResponse,
};
pub use state::{StateError, StateTokenCodec, STATE_TTL_SECONDS};

use serde::Deserialize;

/// Query parameters the provider appends to the callback redirect
#[derive(Deserialize, Debug, Default)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user or provider refused authorization
    pub error: Option<String>,
}
