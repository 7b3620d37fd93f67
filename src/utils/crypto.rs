// Cryptographic utilities: the shared signing secret, HMAC-SHA256 and nonces

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Placeholder value shipped in sample configuration. Never accepted as a key.
pub const PLACEHOLDER_SECRET: &str = "change-me";

/// Keys shorter than this still work but are reported at startup
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Why the configured server secret cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("APP_SECRET is not configured")]
    Missing,
    #[error("APP_SECRET is set to the placeholder default")]
    Placeholder,
}

/// The process-wide symmetric secret used to sign session credentials and
/// fallback CSRF state tokens.
///
/// Construction never fails; an unusable value is reported by
/// [`ServerSecret::signing_key`] so that every signing and verification path
/// refuses to run with it.
#[derive(Clone)]
pub struct ServerSecret {
    raw: String,
}

impl ServerSecret {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Key bytes for HMAC operations
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty or equals [`PLACEHOLDER_SECRET`]
    pub fn signing_key(&self) -> Result<&[u8], SecretError> {
        self.check()?;
        Ok(self.raw.as_bytes())
    }

    /// Validate the secret without borrowing the key
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty or equals [`PLACEHOLDER_SECRET`]
    pub fn check(&self) -> Result<(), SecretError> {
        let trimmed = self.raw.trim();
        if trimmed.is_empty() {
            Err(SecretError::Missing)
        } else if trimmed == PLACEHOLDER_SECRET {
            Err(SecretError::Placeholder)
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.raw.len() < RECOMMENDED_SECRET_LEN
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSecret")
            .field("configured", &self.check().is_ok())
            .finish()
    }
}

/// Generate a CSRF nonce: 128 random bits rendered in the familiar
/// 36-character hyphenated form
#[must_use]
pub fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

/// Sign a message using HMAC-SHA256
///
/// # Errors
///
/// Returns an error if the key is rejected by the MAC implementation
pub fn sign_hmac_sha256(
    key: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, hmac::digest::InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify an HMAC-SHA256 signature in constant time
#[must_use]
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

#[must_use]
pub fn encode_segment(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Strict decoding for segments this service produced itself
///
/// # Errors
///
/// Returns an error if the input is not canonical unpadded base64url
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(segment)
}

/// Lenient decoding for segments produced by third parties, which may use
/// either alphabet and may or may not be padded
///
/// # Errors
///
/// Returns an error if no supported base64 variant accepts the input
pub fn decode_segment_lenient(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let unpadded = segment.trim_end_matches('=');
    general_purpose::URL_SAFE_NO_PAD
        .decode(unpadded)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(unpadded))
}
