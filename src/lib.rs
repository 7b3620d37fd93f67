#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the studyhub-auth service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod handlers;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use error::AuthError;
pub use handlers::{
    configure_services, cors_for, current_user, google_callback, google_sign_in, health,
    legacy_sign_in, sign_out,
};
pub use oauth::OAuthProvider;
pub use session::SessionManager;
pub use settings::AuthSettings;
