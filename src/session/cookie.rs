use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::oauth::state::STATE_TTL_SECONDS;
use crate::session::codec::SESSION_TTL_DAYS;
use crate::settings::StateSameSite;

/// Common cookie names used across the application
pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::days(SESSION_TTL_DAYS),
        }
    }
}

/// Cookie factory for the session credential and the OAuth state nonce
///
/// Issuance and removal go through the same options so a cleared cookie
/// always matches the path and flags it was set with.
#[derive(Debug, Clone)]
pub struct CookieFactory {
    cookie_secure: bool,
    state_same_site: StateSameSite,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool, state_same_site: StateSameSite) -> Self {
        Self {
            cookie_secure,
            state_same_site,
        }
    }

    #[must_use]
    pub fn create_cookie(name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    fn session_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.cookie_secure,
            ..Default::default()
        }
    }

    fn state_options(&self) -> CookieOptions {
        let (same_site, secure) = match self.state_same_site {
            StateSameSite::Lax => (SameSite::Lax, self.cookie_secure),
            // browsers drop SameSite=None cookies that are not Secure
            StateSameSite::None => (SameSite::None, true),
        };
        CookieOptions {
            secure,
            same_site,
            max_age: Duration::seconds(STATE_TTL_SECONDS),
            ..Default::default()
        }
    }

    /// Session credential cookie, valid for the session lifetime
    #[must_use]
    pub fn create_session_cookie(&self, token: String) -> Cookie<'static> {
        Self::create_cookie(SESSION_COOKIE, token, self.session_options())
    }

    /// Short-lived cookie holding the raw state nonce during the OAuth flow
    #[must_use]
    pub fn create_state_cookie(&self, nonce: String) -> Cookie<'static> {
        let cookie = Self::create_cookie(OAUTH_STATE_COOKIE, nonce, self.state_options());
        log::debug!(
            "Creating state cookie: secure={:?}, same_site={:?}",
            cookie.secure(),
            cookie.same_site()
        );
        cookie
    }

    /// Expired session cookie with the flags used at issuance
    #[must_use]
    pub fn create_expired_session_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE, self.session_options())
    }

    /// Expired state cookie with the flags used at issuance
    #[must_use]
    pub fn create_expired_state_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(OAUTH_STATE_COOKIE, self.state_options())
    }
}

/// Value of the named cookie, if the request carries a non-empty one
#[must_use]
pub fn extract_cookie_value(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Create an expired cookie that clears `name` when sent with matching options
#[must_use]
pub fn create_expired_cookie(name: &str, options: CookieOptions) -> Cookie<'static> {
    let mut cookie = CookieFactory::create_cookie(
        name,
        String::new(),
        CookieOptions {
            max_age: Duration::ZERO,
            ..options
        },
    );
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}
