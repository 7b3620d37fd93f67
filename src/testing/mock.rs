//! Mock objects and fake implementations for testing
//!
//! [`MockTokenExchange`] stands in for the provider's token endpoint and
//! records every request it receives.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

use crate::oauth::provider::{ExchangeError, TokenExchange, TokenRequest, TokenResponse};
use crate::utils::crypto::encode_segment;

#[derive(Debug, Clone)]
enum MockReply {
    Success(TokenResponse),
    Rejected { status: u16, body: String },
    Unreachable(String),
}

/// Recording fake of the token endpoint
#[derive(Debug)]
pub struct MockTokenExchange {
    reply: MockReply,
    requests: Mutex<Vec<TokenRequest>>,
}

impl Default for MockTokenExchange {
    /// Succeeds with an empty token response (no `id_token`)
    fn default() -> Self {
        Self::with_response(TokenResponse::default())
    }
}

impl MockTokenExchange {
    #[must_use]
    pub fn with_response(response: TokenResponse) -> Self {
        Self {
            reply: MockReply::Success(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds with a bearer response carrying `id_token`
    #[must_use]
    pub fn with_id_token(id_token: &str) -> Self {
        Self::with_response(TokenResponse {
            id_token: Some(id_token.to_string()),
            access_token: Some("mock-access-token".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3599),
            scope: Some("openid profile email".to_string()),
            ..Default::default()
        })
    }

    /// Answers every exchange with a non-success status
    #[must_use]
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            reply: MockReply::Rejected {
                status,
                body: body.to_string(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every exchange as if the endpoint could not be reached
    #[must_use]
    pub fn unreachable(reason: &str) -> Self {
        Self {
            reply: MockReply::Unreachable(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange(
        &self,
        _token_endpoint: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match &self.reply {
            MockReply::Success(response) => Ok(response.clone()),
            MockReply::Rejected { status, body } => Err(ExchangeError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            MockReply::Unreachable(reason) => Err(ExchangeError::Transport(reason.clone())),
        }
    }
}

/// Build an id_token-shaped string around `claims` with a dummy signature
#[must_use]
pub fn unsigned_id_token(claims: &Value) -> String {
    let header = encode_segment(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = encode_segment(claims.to_string().as_bytes());
    format!("{header}.{payload}.mock-signature")
}
