#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use studyhub_auth::{
    configure_services, cors_for, oauth::OAuthProvider, session::SessionManager,
    settings::AuthSettings, VERSION,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = AuthSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e:#}")))?;

    let provider = OAuthProvider::from_settings(settings.provider.clone()).map_err(|e| {
        std::io::Error::other(format!("Failed to initialize OAuth provider: {e}"))
    })?;
    provider.log_status();

    let session_manager = SessionManager::from_settings(&settings);
    session_manager.log_secret_status();

    println!("✓ Using stateless sessions with signed cookies");
    start_server(provider, session_manager, settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    provider: OAuthProvider,
    session_manager: SessionManager,
    settings: AuthSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let frontend_origin = settings.application.frontend_origin.clone();

    HttpServer::new(move || {
        let cors = cors_for(frontend_origin.as_deref());

        App::new()
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(settings.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &AuthSettings) {
    println!("Starting StudyHub auth service v{VERSION} on http://{bind_address}");
    println!();
    println!("OAuth endpoints:");
    println!("  GET  /auth/google          - Start Google sign-in");
    println!("  GET  /auth/google/callback - OAuth callback");
    println!("  GET  /api/auth/google      - Legacy alias (308 to /auth/google)");
    println!("  POST /auth/logout          - Clear session");
    println!();
    println!("Session endpoints:");
    println!("  GET  /api/me               - Current user claims");
    println!();
    println!("OAuth callback URL for identity providers:");
    println!("  {{scheme}}://{{host}}/auth/google/callback (derived from each request)");
    println!();
    match &settings.application.frontend_origin {
        Some(origin) => println!("Post-login redirect and CORS origin: {origin}"),
        None => println!("Post-login redirect: request origin (no CORS origin configured)"),
    }
    println!();
    println!("System endpoints:");
    println!("  GET  /health               - Health check");
}
