//! Error taxonomy for the authentication endpoints
//!
//! | Kind | Status | Client sees |
//! |---|---|---|
//! | client protocol (missing/invalid code or state, provider denial) | 400 | short generic reason |
//! | upstream (token exchange failure, unusable id_token) | 400 | generic message, detail logged only |
//! | configuration (secret or client credentials unusable) | 500 | explicit operator-facing message |
//! | authentication (anything wrong with the session cookie) | 401 | `unauthorized`, always |

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::oauth::identity::IdentityError;
use crate::oauth::provider::ExchangeError;
use crate::oauth::state::StateError;
use crate::session::codec::SessionError;
use crate::utils::crypto::SecretError;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub const COOKIES_BLOCKED_HINT: &str = "cookies may be blocked, please retry login";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing {0}")]
    MissingParameter(&'static str),
    #[error("malformed callback query: {0}")]
    InvalidQuery(String),
    #[error("provider denied authorization: {0}")]
    ProviderDenied(String),
    #[error("invalid state: {0}")]
    InvalidState(StateError),
    #[error("token exchange failed: {0}")]
    TokenExchange(ExchangeError),
    #[error("token response did not include an id_token")]
    MissingIdToken,
    #[error("invalid id_token: {0}")]
    InvalidIdToken(#[from] IdentityError),
    #[error("server configuration error: {0}")]
    Configuration(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl From<SecretError> for AuthError {
    fn from(err: SecretError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<StateError> for AuthError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Misconfigured(secret) => secret.into(),
            other => Self::InvalidState(other),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Misconfigured(secret) => secret.into(),
            SessionError::Encoding(e) => {
                Self::Configuration(format!("session encoding failed: {e}"))
            }
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

impl AuthError {
    /// Body returned to the client. Never includes upstream responses or the
    /// reason a session was rejected.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Self::MissingParameter(param) => (format!("missing {param}"), None),
            Self::InvalidQuery(_) => ("invalid callback parameters".to_string(), None),
            Self::ProviderDenied(reason) => {
                ("authorization denied".to_string(), Some(reason.clone()))
            }
            Self::InvalidState(StateError::Unverifiable) => (
                "Invalid state".to_string(),
                Some(COOKIES_BLOCKED_HINT.to_string()),
            ),
            Self::InvalidState(_) => ("Invalid state".to_string(), None),
            Self::TokenExchange(_) => ("Token exchange failed".to_string(), None),
            Self::MissingIdToken => ("Missing id_token".to_string(), None),
            Self::InvalidIdToken(_) => ("Invalid id_token".to_string(), None),
            Self::Configuration(message) => (
                "Server configuration error".to_string(),
                Some(message.clone()),
            ),
            Self::Unauthorized(_) => ("unauthorized".to_string(), None),
        };
        ErrorBody { error, details }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
