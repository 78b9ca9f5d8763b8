//! Access-token claims and local HS256 verification.
//!
//! The backend signs access tokens with the shared `SECRET_KEY`; the gate
//! verifies them without a network round trip and only calls the backend
//! when a refresh is needed.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::resources::id_as_string;
use super::user::Role;

/// Claims the gate relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Backend user identifier.
    #[serde(deserialize_with = "id_as_string")]
    pub user_id: String,
    /// Grants `/admin` routes and lifts the organisation restriction.
    #[serde(default)]
    pub is_admin: bool,
    /// Organisation an owner is confined to.
    #[serde(default)]
    pub organization_uid: Option<String>,
    /// Role within the organisation.
    #[serde(default)]
    pub role: Role,
    /// Expiry as seconds since the Unix epoch.
    pub exp: u64,
}

/// Reasons a token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,
    /// Signature, encoding or claim shape is wrong.
    #[error("token invalid: {0}")]
    Invalid(String),
}

/// Verifies HS256 access tokens with the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier for `secret`.
    pub fn new(secret: &Zeroizing<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and verify `token`, enforcing expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(error.to_string()),
            })
    }
}

/// Sign `claims` with `secret`; used by tests to mint backend-shaped tokens.
#[cfg(any(test, feature = "test-support"))]
pub fn sign(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{EncodingKey, Header, encode};
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
