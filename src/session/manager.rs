//! Session Manager - stateless signed sessions
//!
//! `SessionManager` is the single place that turns requests into verified
//! claims and claims into cookies. It owns both codecs (state and session)
//! keyed by the same server secret, and the `CookieFactory` that applies the
//! configured cookie flags.
//!
//! Nothing is stored server-side: the state nonce lives in the `oauth_state`
//! cookie (and signed in the URL), the session lives in the `session` cookie.

use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use chrono::Utc;
use log::{debug, warn};

use crate::error::AuthError;
use crate::oauth::identity::IdentityClaims;
use crate::oauth::state::StateTokenCodec;
use crate::session::codec::{SessionClaims, SessionCodec};
use crate::session::cookie::{
    extract_cookie_value, CookieFactory, OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use crate::settings::AuthSettings;
use crate::utils::crypto::ServerSecret;

/// State handed to the authorization redirect
#[derive(Debug)]
pub struct StartedFlow {
    /// Cookie carrying the raw nonce
    pub cookie: Cookie<'static>,
    /// Signed value for the `state` query parameter
    pub state: String,
}

// =============================================================================
// Session Manager Structure
// =============================================================================

#[derive(Debug, Clone)]
pub struct SessionManager {
    secret: ServerSecret,
    state_codec: StateTokenCodec,
    session_codec: SessionCodec,
    cookie_factory: CookieFactory,
}

// =============================================================================
// 1. Construction
// =============================================================================

impl SessionManager {
    #[must_use]
    pub fn new(secret: ServerSecret, cookie_factory: CookieFactory) -> Self {
        Self {
            state_codec: StateTokenCodec::new(secret.clone()),
            session_codec: SessionCodec::new(secret.clone()),
            secret,
            cookie_factory,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let secret = ServerSecret::new(settings.session.app_secret.clone());
        let cookie_factory =
            CookieFactory::new(settings.cookies.secure, settings.cookies.state_same_site);
        Self::new(secret, cookie_factory)
    }

    /// Check the server secret once at startup; signing stays blocked until
    /// it is fixed, but the server keeps serving health checks.
    pub fn log_secret_status(&self) {
        match self.secret.check() {
            Ok(()) if self.secret.is_weak() => {
                warn!("APP_SECRET is shorter than recommended; use at least 32 random bytes");
            }
            Ok(()) => debug!("Session signing secret configured"),
            Err(e) => log::error!(
                "APP_SECRET is unusable ({e}); sign-in and session checks will fail with 500"
            ),
        }
    }
}

// =============================================================================
// 2. OAuth State
// =============================================================================

impl SessionManager {
    /// Start a sign-in attempt: fresh nonce, cookie and signed state
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the server secret is unusable
    pub fn start_flow(&self) -> Result<StartedFlow, AuthError> {
        let issued = self.state_codec.issue(Utc::now())?;
        Ok(StartedFlow {
            cookie: self.cookie_factory.create_state_cookie(issued.nonce),
            state: issued.token,
        })
    }

    /// Validate the `state` returned on the callback against the request's
    /// state cookie, falling back to the signature when the cookie is gone
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] when the state is rejected, or a
    /// configuration error if the server secret is unusable
    pub fn validate_callback_state(
        &self,
        req: &HttpRequest,
        returned_state: &str,
    ) -> Result<(), AuthError> {
        let stored = extract_cookie_value(req, OAUTH_STATE_COOKIE);
        if stored.is_none() {
            debug!("No state cookie on callback, trying signed state fallback");
        }
        self.state_codec
            .validate_callback_state(stored.as_deref(), returned_state, Utc::now())
            .map(|_| ())
            .map_err(|e| {
                warn!("OAuth state rejected: {e}");
                AuthError::from(e)
            })
    }

    #[must_use]
    pub fn expired_state_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_state_cookie()
    }
}

// =============================================================================
// 3. Sessions
// =============================================================================

impl SessionManager {
    /// Mint a session cookie for the authenticated identity
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the server secret is unusable
    pub fn create_session_cookie(
        &self,
        identity: &IdentityClaims,
    ) -> Result<Cookie<'static>, AuthError> {
        let token = self.session_codec.issue(identity, Utc::now())?;
        Ok(self.cookie_factory.create_session_cookie(token))
    }

    /// Verify the request's session cookie and return its claims
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if the cookie is missing or fails
    /// verification, or a configuration error if the server secret is unusable
    pub fn verify_request(&self, req: &HttpRequest) -> Result<SessionClaims, AuthError> {
        let token = extract_cookie_value(req, SESSION_COOKIE)
            .ok_or_else(|| AuthError::Unauthorized("no session cookie".to_string()))?;

        self.session_codec.verify(&token, Utc::now()).map_err(|e| {
            debug!("Session rejected: {e}");
            AuthError::from(e)
        })
    }

    #[must_use]
    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_session_cookie()
    }

    #[must_use]
    pub fn session_codec(&self) -> &SessionCodec {
        &self.session_codec
    }
}
