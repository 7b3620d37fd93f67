//! Testing utilities for studyhub-auth
//!
//! Compiled for unit tests and with the `testing` feature.
//!
//! - [`fixtures`] - Pre-built settings, provider and session manager
//! - [`mock`] - Recording token endpoint and unsigned identity tokens
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studyhub_auth::testing::{mock::MockTokenExchange, TestFixtures};
//!
//! let exchange = Arc::new(MockTokenExchange::with_id_token("header.payload.sig"));
//! let provider = TestFixtures::provider(exchange.clone());
//! let manager = TestFixtures::session_manager();
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{unsigned_id_token, MockTokenExchange};

/// Common test constants
pub mod constants {
    /// Signing secret used by every fixture (long enough not to warn)
    pub const TEST_APP_SECRET: &str = "test-app-secret-0123456789abcdef0123";

    pub const TEST_CLIENT_ID: &str = "test-client-id";

    pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

    /// Default test subject
    pub const TEST_SUBJECT: &str = "u1";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "Ada";

    /// Default test email address
    pub const TEST_EMAIL: &str = "ada@example.com";

    pub const TEST_PICTURE: &str = "https://example.com/ada.png";

    /// Host used by request-level tests
    pub const TEST_HOST: &str = "study.example.com";
}
