// Centralized logging for the sign-in flow
use log::{debug, info};
use std::collections::HashMap;

use crate::oauth::provider::TokenResponse;
use crate::oauth::OAuthCallback;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log provider initialization status
    pub fn log_provider_init(provider_name: &str, display_name: &str, configured: bool) {
        if configured {
            info!("✅ {display_name} OAuth2 configured ({provider_name})");
        } else {
            info!("❌ {display_name} OAuth2 not configured - missing client id or secret");
        }
    }

    pub fn log_oauth_url_built(
        provider: &str,
        scopes: &str,
        extra_params: &HashMap<String, String>,
    ) {
        debug!(
            "🔍 Built {provider} OAuth URL with scopes: {scopes} and extra params: {extra_params:?}"
        );
    }

    pub fn log_token_exchange_start(provider: &str) {
        info!("🔄 Exchanging authorization code for tokens with {provider}");
    }

    /// Presence only; token values never reach the log
    pub fn log_token_exchange_summary(provider: &str, response: &TokenResponse) {
        let presence = |token: Option<&String>| if token.is_some() { "present" } else { "missing" };
        info!(
            "🔍 Token exchange summary for {provider}: id_token={}, access_token={}, refresh_token={}, token_type={:?}, scope={:?}",
            presence(response.id_token.as_ref()),
            presence(response.access_token.as_ref()),
            presence(response.refresh_token.as_ref()),
            response.token_type,
            response.scope,
        );
    }

    pub fn log_session_created(subject: &str, provider: &str) {
        info!("Successfully created session for subject {subject} (provider: {provider})");
    }

    /// Log OAuth callback details; code and state are reduced to lengths
    pub fn log_callback_debug(req: &actix_web::HttpRequest, callback: &OAuthCallback) {
        debug!(
            "OAuth callback received via {}: code_len={:?}, state_len={:?}, error={:?}",
            req.method(),
            callback.code.as_ref().map(String::len),
            callback.state.as_ref().map(String::len),
            callback.error
        );
        debug!("Callback request connection info: {:?}", req.connection_info());
    }
}
