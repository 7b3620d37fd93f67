//! CSRF state for the authorization-code flow
//!
//! Every sign-in attempt gets a fresh random nonce. The nonce is stored raw in
//! the short-lived `oauth_state` cookie and travels to the identity provider
//! (and back) inside a signed token of the form
//! `<nonce>.<issued_at>.<signature>`, where the signature is HMAC-SHA256 over
//! `<nonce>.<issued_at>` under the server secret. The cookie is the primary
//! proof; the signature lets the callback succeed when the browser dropped
//! the cookie.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use thiserror::Error;

use crate::utils::crypto::{
    decode_segment, encode_segment, generate_state_nonce, sign_hmac_sha256, verify_hmac_sha256,
    SecretError, ServerSecret,
};

/// Lifetime of both the state cookie and the signed state token
pub const STATE_TTL_SECONDS: i64 = 600;

/// Keeps state signatures from being interchangeable with other HMACs made
/// under the same secret
const STATE_SIGNING_CONTEXT: &[u8] = b"oauth_state:";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state signing is unavailable: {0}")]
    Misconfigured(#[from] SecretError),
    #[error("state parameter is malformed")]
    Malformed,
    #[error("state signature does not verify")]
    BadSignature,
    #[error("state parameter has expired")]
    Expired,
    #[error("state parameter does not match the stored state cookie")]
    Mismatch,
    #[error("no state cookie present and the state parameter carries no valid signature")]
    Unverifiable,
}

/// A freshly generated state, ready to be split between cookie and URL
#[derive(Debug, Clone)]
pub struct IssuedState {
    /// Raw nonce, stored in the state cookie
    pub nonce: String,
    /// Signed token, sent as the `state` query parameter
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct StateTokenCodec {
    secret: ServerSecret,
    ttl: Duration,
}

impl StateTokenCodec {
    #[must_use]
    pub fn new(secret: ServerSecret) -> Self {
        Self {
            secret,
            ttl: Duration::seconds(STATE_TTL_SECONDS),
        }
    }

    /// Generate a nonce and its signed transport form
    ///
    /// # Errors
    ///
    /// Returns an error if the server secret is unusable
    pub fn issue(&self, now: DateTime<Utc>) -> Result<IssuedState, StateError> {
        let nonce = generate_state_nonce();
        let token = self.sign(&nonce, now.timestamp())?;
        Ok(IssuedState { nonce, token })
    }

    /// Build the signed token for a nonce issued at `issued_at`
    ///
    /// # Errors
    ///
    /// Returns an error if the server secret is unusable
    pub fn sign(&self, nonce: &str, issued_at: i64) -> Result<String, StateError> {
        let key = self.secret.signing_key()?;
        let message = format!("{nonce}.{issued_at}");
        let signature = sign_hmac_sha256(key, &Self::signing_input(&message))
            .map_err(|_| StateError::BadSignature)?;
        Ok(format!("{message}.{}", encode_segment(&signature)))
    }

    /// Verify a signed token and return the nonce it carries
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is unusable, the token is malformed, the
    /// signature does not verify or the token is outside its validity window
    pub fn verify_signed(&self, token: &str, now: DateTime<Utc>) -> Result<String, StateError> {
        let key = self.secret.signing_key()?;

        let (message, signature) = token.rsplit_once('.').ok_or(StateError::Malformed)?;
        let (nonce, issued_at) = message.rsplit_once('.').ok_or(StateError::Malformed)?;
        if nonce.is_empty() {
            return Err(StateError::Malformed);
        }
        let issued_at: i64 = issued_at.parse().map_err(|_| StateError::Malformed)?;
        let signature = decode_segment(signature).map_err(|_| StateError::Malformed)?;

        if !verify_hmac_sha256(key, &Self::signing_input(message), &signature) {
            return Err(StateError::BadSignature);
        }

        let age = now.timestamp() - issued_at;
        if age < 0 || age > self.ttl.num_seconds() {
            debug!("Signed state rejected: age {age}s outside validity window");
            return Err(StateError::Expired);
        }

        Ok(nonce.to_string())
    }

    /// Decide whether the `state` returned on the callback proves the request
    /// originated from this server.
    ///
    /// With a state cookie present, the returned value (after its signature,
    /// if any, has been verified and stripped) must equal the cookie. Without
    /// a cookie, a valid signature alone is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the state was rejected
    pub fn validate_callback_state(
        &self,
        stored_nonce: Option<&str>,
        returned: &str,
        now: DateTime<Utc>,
    ) -> Result<String, StateError> {
        match stored_nonce {
            Some(stored) => {
                let returned_nonce = if returned.contains('.') {
                    self.verify_signed(returned, now)?
                } else {
                    returned.to_string()
                };
                if returned_nonce == stored {
                    Ok(returned_nonce)
                } else {
                    Err(StateError::Mismatch)
                }
            }
            None => self.verify_signed(returned, now).map_err(|e| match e {
                StateError::Misconfigured(inner) => StateError::Misconfigured(inner),
                other => {
                    debug!("Cookie-less state fallback failed: {other}");
                    StateError::Unverifiable
                }
            }),
        }
    }

    fn signing_input(message: &str) -> Vec<u8> {
        let mut input = Vec::with_capacity(STATE_SIGNING_CONTEXT.len() + message.len());
        input.extend_from_slice(STATE_SIGNING_CONTEXT);
        input.extend_from_slice(message.as_bytes());
        input
    }
}
