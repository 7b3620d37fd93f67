//! Identity provider client
//!
//! Builds the authorization redirect and performs the server-to-server
//! authorization-code exchange. The HTTP call sits behind the
//! [`TokenExchange`] trait so the callback flow can run against a recorded
//! fake in tests.

use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::error::AuthError;
use crate::settings::ProviderSettings;
use crate::utils::logging::LoggingHelper;

pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Form body POSTed to the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub code: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub grant_type: String,
}

/// Token endpoint response; only `id_token` is consumed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("token endpoint returned {status}")]
    Rejected { status: u16, body: String },
    #[error("token endpoint unreachable: {0}")]
    Transport(String),
    #[error("token endpoint response could not be parsed: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// POST the request to the token endpoint and parse the reply
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an
    /// unparseable body
    async fn exchange(
        &self,
        token_endpoint: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError>;
}

/// [`TokenExchange`] over HTTPS with reqwest
pub struct HttpTokenExchange {
    http_client: reqwest::Client,
}

impl HttpTokenExchange {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(
        &self,
        token_endpoint: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let response = self
            .http_client
            .post(token_endpoint)
            .form(request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::InvalidResponse(e.to_string()))
    }
}

/// Provider configuration plus the exchange transport
#[derive(Clone)]
pub struct OAuthProvider {
    settings: ProviderSettings,
    exchanger: Arc<dyn TokenExchange>,
}

impl OAuthProvider {
    #[must_use]
    pub fn new(settings: ProviderSettings, exchanger: Arc<dyn TokenExchange>) -> Self {
        Self {
            settings,
            exchanger,
        }
    }

    /// Provider backed by the real HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn from_settings(settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(settings.exchange_timeout_secs);
        let exchanger = HttpTokenExchange::new(timeout)?;
        Ok(Self::new(settings, Arc::new(exchanger)))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Client id, resolved from the environment override or the settings file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no client id is set
    pub fn client_id(&self) -> Result<String, AuthError> {
        self.settings
            .get_client_id()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AuthError::Configuration(format!(
                    "{} client id is not configured",
                    self.settings.display_name()
                ))
            })
    }

    fn client_secret(&self) -> Result<String, AuthError> {
        self.settings
            .get_client_secret()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                AuthError::Configuration(format!(
                    "{} client secret is not configured",
                    self.settings.display_name()
                ))
            })
    }

    /// Build the authorization redirect for this provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the client id is missing or the
    /// authorization endpoint is not a valid URL
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        let client_id = self.client_id()?;
        let scopes = self.settings.scopes.join(" ");

        let mut url = url::Url::parse(&self.settings.authorization_endpoint).map_err(|e| {
            AuthError::Configuration(format!("invalid authorization endpoint: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes);

        let mut extra_params: Vec<_> = self.settings.extra_auth_params.iter().collect();
        extra_params.sort();
        for (key, value) in extra_params {
            url.query_pairs_mut().append_pair(key, value);
        }
        url.query_pairs_mut().append_pair("state", state);

        LoggingHelper::log_oauth_url_built(self.name(), &scopes, &self.settings.extra_auth_params);
        Ok(url.to_string())
    }

    /// Exchange an authorization code for the provider's token response
    ///
    /// # Errors
    ///
    /// Returns a configuration error if client credentials are missing, or a
    /// token exchange error if the provider call fails
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let request = TokenRequest {
            code: code.to_string(),
            client_id: self.client_id()?,
            client_secret: self.client_secret()?,
            redirect_uri: redirect_uri.to_string(),
            grant_type: AUTHORIZATION_CODE_GRANT.to_string(),
        };

        LoggingHelper::log_token_exchange_start(self.name());
        match self
            .exchanger
            .exchange(&self.settings.token_endpoint, &request)
            .await
        {
            Ok(response) => {
                LoggingHelper::log_token_exchange_summary(self.name(), &response);
                Ok(response)
            }
            Err(ExchangeError::Rejected { status, body }) => {
                error!("Token exchange with {} failed ({status}): {body}", self.name());
                Err(AuthError::TokenExchange(ExchangeError::Rejected { status, body }))
            }
            Err(e) => {
                error!("Token exchange with {} failed: {e}", self.name());
                Err(AuthError::TokenExchange(e))
            }
        }
    }

    /// Log configuration status at startup
    pub fn log_status(&self) {
        let configured = self.client_id().is_ok() && self.client_secret().is_ok();
        LoggingHelper::log_provider_init(self.name(), self.settings.display_name(), configured);
        if configured {
            info!("Token endpoint: {}", self.settings.token_endpoint);
        } else {
            debug!("Sign-in will fail until client credentials are provided");
        }
    }
}
