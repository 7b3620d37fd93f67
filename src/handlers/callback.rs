// OAuth callback handler
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::{error, warn};

use crate::error::AuthError;
use crate::oauth::{IdentityClaims, OAuthCallback, OAuthProvider};
use crate::session::SessionManager;
use crate::settings::AuthSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::request::{app_root, callback_url};

/// Complete the Google sign-in flow
///
/// Validates state, exchanges the code, turns the identity token into a
/// session cookie, clears the state cookie and redirects (302) to the app.
/// Any failure ends the request without setting a session cookie.
///
/// # Errors
///
/// Returns 400 for missing or invalid parameters, a rejected state, a failed
/// token exchange or an unusable identity token, and 500 if the server is
/// misconfigured
pub async fn google_callback(
    query: web::Query<OAuthCallback>,
    req: HttpRequest,
    provider: web::Data<OAuthProvider>,
    session_manager: web::Data<SessionManager>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AuthError> {
    let callback = query.into_inner();
    LoggingHelper::log_callback_debug(&req, &callback);

    let (code, state) = validate_callback(&callback)?;
    session_manager.validate_callback_state(&req, &state)?;

    // Must match the redirect_uri sent by the initiator on this host
    let redirect_uri = callback_url(&req);
    let tokens = provider.exchange_code(&code, &redirect_uri).await?;

    let id_token = tokens.id_token.ok_or_else(|| {
        error!("Token response from {} had no id_token", provider.name());
        AuthError::MissingIdToken
    })?;
    let identity = IdentityClaims::from_id_token(&id_token).map_err(|e| {
        error!("Failed to decode id_token from {}: {e}", provider.name());
        AuthError::from(e)
    })?;
    identity.check_audience(&provider.client_id()?).map_err(|e| {
        error!("Rejected id_token from {}: {e}", provider.name());
        AuthError::from(e)
    })?;

    let session_cookie = session_manager.create_session_cookie(&identity)?;
    LoggingHelper::log_session_created(&identity.sub, provider.name());

    let location = app_root(&req, settings.application.frontend_origin.as_deref());
    Ok(HttpResponse::Found()
        .cookie(session_cookie)
        .cookie(session_manager.expired_state_cookie())
        .insert_header((header::LOCATION, location))
        .finish())
}

/// Extract the code and state, rejecting provider errors and missing values
fn validate_callback(callback: &OAuthCallback) -> Result<(String, String), AuthError> {
    if let Some(reason) = &callback.error {
        warn!("Provider returned an error on callback: {reason}");
        return Err(AuthError::ProviderDenied(reason.clone()));
    }

    let code = non_empty(callback.code.as_ref()).ok_or(AuthError::MissingParameter("code"))?;
    let state = non_empty(callback.state.as_ref()).ok_or(AuthError::MissingParameter("state"))?;
    Ok((code, state))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}
