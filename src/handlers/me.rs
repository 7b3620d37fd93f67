// Identity endpoint
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::AuthError;
use crate::session::{SessionClaims, SessionManager};

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub user: SessionClaims,
}

/// Return the claims of the caller's session
///
/// # Errors
///
/// Returns 401 if the session cookie is missing or fails verification for
/// any reason, and 500 if the server secret is not configured
pub async fn current_user(
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AuthError> {
    let user = session_manager.verify_request(&req)?;
    Ok(HttpResponse::Ok().json(CurrentUser { user }))
}
