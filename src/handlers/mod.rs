// HTTP request handlers for the sign-in flow
pub mod auth;
pub mod callback;
pub mod health;
pub mod me;


use actix_cors::Cors;
use actix_web::{error::QueryPayloadError, web, HttpRequest};

use crate::error::AuthError;

// Re-export the main handler functions
pub use auth::{google_sign_in, legacy_sign_in, sign_out};
pub use callback::google_callback;
pub use health::health;
pub use me::current_user;

/// Route table. Expects `OAuthProvider`, `SessionManager` and
/// `AuthSettings` registered as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error));

    cfg
        // OAuth endpoints
        .route("/auth/google", web::get().to(google_sign_in))
        .route("/api/auth/google", web::get().to(legacy_sign_in))
        .route("/auth/google/callback", web::get().to(google_callback))
        .route("/auth/logout", web::post().to(sign_out))
        // Session endpoint
        .route("/api/me", web::get().to(current_user))
        // Health endpoint
        .route("/health", web::get().to(health));
}

/// Unparseable query strings get the same JSON error body as every other
/// callback failure
fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejecting query for {}: {err}", req.path());
    AuthError::InvalidQuery(err.to_string()).into()
}

/// CORS policy. Only the configured frontend may call with credentials;
/// without one, cross-origin requests are refused.
#[must_use]
pub fn cors_for(frontend_origin: Option<&str>) -> Cors {
    match frontend_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600),
        None => Cors::default(),
    }
}
