//! Session credential codec
//!
//! Sessions are compact HS256 JWTs (`header.payload.signature`, base64url
//! without padding) signed with the server secret. They carry the user's
//! identity claims plus `iat`/`exp`, and are valid for a fixed 7 days.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oauth::identity::IdentityClaims;
use crate::utils::crypto::{
    decode_segment, encode_segment, sign_hmac_sha256, verify_hmac_sha256, SecretError,
    ServerSecret,
};

pub const SESSION_TTL_DAYS: i64 = 7;

const JWT_ALGORITHM: &str = "HS256";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session signing is unavailable: {0}")]
    Misconfigured(#[from] SecretError),
    #[error("failed to encode session claims: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("session token is malformed")]
    Malformed,
    #[error("session signature does not verify")]
    BadSignature,
    #[error("session has expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// Claims embedded in the session credential and returned by `/api/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expires at (Unix timestamp, seconds)
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn from_identity(
        identity: &IdentityClaims,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: identity.sub.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            picture: identity.picture.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, Clone)]
pub struct SessionCodec {
    secret: ServerSecret,
    ttl: Duration,
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: ServerSecret) -> Self {
        Self {
            secret,
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    /// Mint a signed session credential for `identity`
    ///
    /// # Errors
    ///
    /// Returns an error if the server secret is unusable or the claims cannot
    /// be serialized
    pub fn issue(
        &self,
        identity: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let claims = SessionClaims::from_identity(identity, now, self.ttl);
        self.encode(&claims)
    }

    /// Sign an explicit set of claims
    ///
    /// # Errors
    ///
    /// Returns an error if the server secret is unusable or the claims cannot
    /// be serialized
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let key = self.secret.signing_key()?;

        let header = JwtHeader {
            alg: JWT_ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = encode_segment(&serde_json::to_vec(&header)?);
        let payload_b64 = encode_segment(&serde_json::to_vec(claims)?);
        let message = format!("{header_b64}.{payload_b64}");

        let signature =
            sign_hmac_sha256(key, message.as_bytes()).map_err(|_| SessionError::BadSignature)?;
        Ok(format!("{message}.{}", encode_segment(&signature)))
    }

    /// Verify signature and expiry, returning the embedded claims
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Misconfigured`] if the server secret is
    /// unusable, otherwise an error describing why the token was rejected
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let key = self.secret.signing_key()?;

        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionError::Malformed);
        };

        let signature = decode_segment(signature_b64).map_err(|_| SessionError::Malformed)?;
        let message = format!("{header_b64}.{payload_b64}");
        if !verify_hmac_sha256(key, message.as_bytes(), &signature) {
            return Err(SessionError::BadSignature);
        }

        let header: JwtHeader = decode_segment(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(SessionError::Malformed)?;
        if header.alg != JWT_ALGORITHM {
            return Err(SessionError::Malformed);
        }

        let claims: SessionClaims = decode_segment(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(SessionError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}
