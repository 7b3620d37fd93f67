// Identity claims carried in the provider's id_token
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::crypto::decode_segment_lenient;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("id_token is not a compact JWT")]
    Format,
    #[error("id_token payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("id_token payload is not valid claims JSON: {0}")]
    Claims(#[from] serde_json::Error),
    #[error("id_token subject is empty")]
    EmptySubject,
    #[error("id_token was issued for a different client")]
    AudienceMismatch,
}

/// `aud` may be a single string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    #[must_use]
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Many(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

/// User identity as asserted by the provider. Only `sub` is a stable key;
/// the remaining fields are display data and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
}

impl IdentityClaims {
    /// Decode the payload segment of an id_token.
    ///
    /// The signature segment is not checked: the token is only ever read
    /// straight from the token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no payload segment, the payload is
    /// not base64 JSON, or the subject is empty
    pub fn from_id_token(id_token: &str) -> Result<Self, IdentityError> {
        let payload = id_token
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or(IdentityError::Format)?;

        let bytes = decode_segment_lenient(payload)?;
        let claims: Self = serde_json::from_slice(&bytes)?;

        if claims.sub.trim().is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        Ok(claims)
    }

    /// When the token names an audience it must include our client id
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::AudienceMismatch`] if `aud` is present and
    /// does not contain `client_id`
    pub fn check_audience(&self, client_id: &str) -> Result<(), IdentityError> {
        match &self.aud {
            Some(aud) if !aud.contains(client_id) => Err(IdentityError::AudienceMismatch),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::unsigned_id_token;
    use serde_json::json;

    #[test]
    fn test_decode_google_style_token() {
        let token = unsigned_id_token(&json!({
            "sub": "1234567890",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "picture": "https://example.com/ada.png",
            "aud": "client-123",
            "iss": "https://accounts.google.com"
        }));
        let claims = IdentityClaims::from_id_token(&token).unwrap();
        assert_eq!(claims.sub, "1234567890");
        assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.picture.as_deref(), Some("https://example.com/ada.png"));
        assert!(claims.check_audience("client-123").is_ok());
        assert!(matches!(
            claims.check_audience("someone-else"),
            Err(IdentityError::AudienceMismatch)
        ));
    }

    #[test]
    fn test_display_fields_are_optional() {
        let token = unsigned_id_token(&json!({ "sub": "u1" }));
        let claims = IdentityClaims::from_id_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.name.is_none());
        assert!(claims.email.is_none());
        assert!(claims.picture.is_none());
        assert!(claims.check_audience("anything").is_ok());
    }

    #[test]
    fn test_audience_list() {
        let token = unsigned_id_token(&json!({ "sub": "u1", "aud": ["a", "client-123"] }));
        let claims = IdentityClaims::from_id_token(&token).unwrap();
        assert!(claims.check_audience("client-123").is_ok());
        assert!(claims.check_audience("b").is_err());
    }

    #[test]
    fn test_padded_standard_base64_payload() {
        // {"sub":"u1","name":"Ada"} in the standard alphabet with padding
        let token = "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1MSIsIm5hbWUiOiJBZGEifQ==.sig";
        let claims = IdentityClaims::from_id_token(token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_rejects_bad_tokens() {
        assert!(matches!(
            IdentityClaims::from_id_token("no-dots-here"),
            Err(IdentityError::Format)
        ));
        assert!(matches!(
            IdentityClaims::from_id_token("a..c"),
            Err(IdentityError::Format)
        ));
        assert!(matches!(
            IdentityClaims::from_id_token("a.!!!.c"),
            Err(IdentityError::Encoding(_))
        ));
        let not_json = format!("a.{}.c", crate::utils::crypto::encode_segment(b"not json"));
        assert!(matches!(
            IdentityClaims::from_id_token(&not_json),
            Err(IdentityError::Claims(_))
        ));
        let missing_sub = unsigned_id_token(&json!({ "name": "Ada" }));
        assert!(matches!(
            IdentityClaims::from_id_token(&missing_sub),
            Err(IdentityError::Claims(_))
        ));
        let empty_sub = unsigned_id_token(&json!({ "sub": "" }));
        assert!(matches!(
            IdentityClaims::from_id_token(&empty_sub),
            Err(IdentityError::EmptySubject)
        ));
    }
}
