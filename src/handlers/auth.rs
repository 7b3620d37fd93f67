// Authentication handlers: sign-in and sign-out
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::{debug, info};
use serde_json::json;

use crate::error::AuthError;
use crate::oauth::OAuthProvider;
use crate::session::SessionManager;
use crate::utils::request::callback_url;

/// Path of the sign-in entry point
pub const SIGN_IN_PATH: &str = "/auth/google";

/// Start the Google sign-in flow
///
/// Sets the `oauth_state` cookie and redirects (302) to the provider with
/// the signed state and a callback URL derived from this request's host.
///
/// # Errors
///
/// Returns a configuration error (500) if the server secret or the client id
/// is not usable
pub async fn google_sign_in(
    req: HttpRequest,
    provider: web::Data<OAuthProvider>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AuthError> {
    let redirect_uri = callback_url(&req);
    let flow = session_manager.start_flow()?;
    let auth_url = provider.authorization_url(&redirect_uri, &flow.state)?;

    info!("Redirecting to {} OAuth", provider.name());
    debug!("Callback URL for this request: {redirect_uri}");

    Ok(HttpResponse::Found()
        .cookie(flow.cookie)
        .insert_header((header::LOCATION, auth_url))
        .finish())
}

/// Earlier frontends linked to `/api/auth/google`; keep them working
pub async fn legacy_sign_in(req: HttpRequest) -> HttpResponse {
    let location = match req.query_string() {
        "" => SIGN_IN_PATH.to_string(),
        query => format!("{SIGN_IN_PATH}?{query}"),
    };
    HttpResponse::PermanentRedirect()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Clear the session cookie. Needs no authentication and cannot fail.
pub async fn sign_out(session_manager: web::Data<SessionManager>) -> HttpResponse {
    info!("User signed out, session cookie cleared");
    HttpResponse::Ok()
        .cookie(session_manager.expired_session_cookie())
        .json(json!({ "ok": true }))
}
