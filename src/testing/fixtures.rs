//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use crate::oauth::identity::{Audience, IdentityClaims};
use crate::oauth::provider::{OAuthProvider, TokenExchange};
use crate::session::{CookieFactory, SessionManager};
use crate::settings::{
    AuthSettings, CookieSettings, ProviderSettings, SessionSettings, StateSameSite,
};
use crate::utils::crypto::ServerSecret;

use super::constants::{
    TEST_APP_SECRET, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_EMAIL, TEST_PICTURE, TEST_SUBJECT,
    TEST_USER_NAME,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Google provider settings with inline credentials and no env lookups
    #[must_use]
    pub fn provider_settings() -> ProviderSettings {
        ProviderSettings {
            client_id: Some(TEST_CLIENT_ID.to_string()),
            client_secret: Some(TEST_CLIENT_SECRET.to_string()),
            client_id_env: None,
            client_secret_env: None,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn provider(exchanger: Arc<dyn TokenExchange>) -> OAuthProvider {
        OAuthProvider::new(Self::provider_settings(), exchanger)
    }

    /// Settings for plain-HTTP tests: insecure cookies, test secret
    #[must_use]
    pub fn settings() -> AuthSettings {
        AuthSettings {
            provider: Self::provider_settings(),
            session: SessionSettings {
                app_secret: TEST_APP_SECRET.to_string(),
            },
            cookies: CookieSettings {
                secure: false,
                state_same_site: StateSameSite::Lax,
            },
            ..Default::default()
        }
    }

    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::from_settings(&Self::settings())
    }

    #[must_use]
    pub fn session_manager_with_secret(secret: &str) -> SessionManager {
        SessionManager::new(
            ServerSecret::new(secret),
            CookieFactory::new(false, StateSameSite::Lax),
        )
    }

    /// Identity as decoded from a Google id_token
    #[must_use]
    pub fn identity() -> IdentityClaims {
        IdentityClaims {
            sub: TEST_SUBJECT.to_string(),
            name: Some(TEST_USER_NAME.to_string()),
            email: Some(TEST_EMAIL.to_string()),
            picture: Some(TEST_PICTURE.to_string()),
            aud: Some(Audience::Single(TEST_CLIENT_ID.to_string())),
        }
    }
}
