//! Driving port for identity use-cases backed by the practice backend.
//!
//! The auth gate and the auth context both depend on this trait rather than
//! the HTTP adapter, so their tests substitute a double instead of a network.

use async_trait::async_trait;

use super::define_port_error;
use super::backend_api::BackendApiError;
use crate::domain::forms::ValidationError;
use crate::domain::{Identity, LoginCredentials, PhoneRequest};

/// Access/refresh token pair issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access: String,
    /// Refresh token used to renew the access token.
    pub refresh: String,
}

/// Result of a login attempt that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted; the tokens still need writing as cookies.
    Authenticated(TokenPair),
    /// Backend rejected the credentials with field-level messages.
    Rejected(Vec<ValidationError>),
}

/// Result of a phone verification or password reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneFlowOutcome {
    /// Backend accepted the request; carries its confirmation message.
    Accepted(Option<String>),
    /// Backend rejected the request with field-level messages.
    Rejected(Vec<ValidationError>),
}

define_port_error! {
    /// Errors surfaced by identity adapters.
    pub enum IdentityServiceError {
        /// The backend could not be reached.
        Unavailable { message: String } =>
            "identity backend unavailable: {message}",
        /// The backend answered with a body the gateway cannot interpret.
        Decode { message: String } =>
            "identity response decode failed: {message}",
    }
}

impl From<BackendApiError> for IdentityServiceError {
    fn from(value: BackendApiError) -> Self {
        Self::unavailable(value.to_string())
    }
}

/// Identity use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Forward the raw `Cookie` header to the "who am I" endpoint and report whether it
    /// answered `200`. Only the status is inspected.
    async fn probe(&self, cookie_header: Option<String>) -> Result<bool, IdentityServiceError>;

    /// Resolve the identity behind the forwarded cookies; `None` when the
    /// backend answers anything other than `200`.
    async fn who_am_i(
        &self,
        cookie_header: Option<String>,
    ) -> Result<Option<Identity>, IdentityServiceError>;

    /// Submit validated credentials.
    async fn login(&self, credentials: &LoginCredentials)
    -> Result<LoginOutcome, IdentityServiceError>;

    /// Ask the backend to invalidate the session behind the cookies.
    async fn logout(&self, cookie_header: Option<String>) -> Result<(), IdentityServiceError>;

    /// Exchange a refresh token for a new pair; `None` when refused.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, IdentityServiceError>;

    /// Start phone-number verification.
    async fn request_phone_verification(
        &self,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError>;

    /// Start the forgot-password flow.
    async fn forgot_password(
        &self,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError>;
}

/// Phone number accepted by [`FixtureIdentityService`].
pub const FIXTURE_PHONE: &str = "01712345678";
/// Password accepted by [`FixtureIdentityService`].
pub const FIXTURE_PASSWORD: &str = "password123";

/// In-memory identity service for local development and HTTP tests.
///
/// Accepts [`FIXTURE_PHONE`] / [`FIXTURE_PASSWORD`], issues `tokens`, and
/// treats any cookie header containing `access_token=<tokens.access>` as
/// authenticated.
#[derive(Debug, Clone)]
pub struct FixtureIdentityService {
    /// Identity returned for a matching cookie.
    pub identity: Identity,
    /// Tokens the fixture issues and accepts.
    pub tokens: TokenPair,
}

impl FixtureIdentityService {
    /// Build a fixture answering with `identity` and issuing `tokens`.
    pub fn new(identity: Identity, tokens: TokenPair) -> Self {
        Self { identity, tokens }
    }

    fn is_authenticated(&self, cookie_header: Option<&str>) -> bool {
        let expected = format!("access_token={}", self.tokens.access);
        cookie_header.is_some_and(|header| {
            header
                .split(';')
                .any(|pair| pair.trim() == expected.as_str())
        })
    }
}

#[async_trait]
impl IdentityService for FixtureIdentityService {
    async fn probe(&self, cookie_header: Option<String>) -> Result<bool, IdentityServiceError> {
        Ok(self.is_authenticated(cookie_header.as_deref()))
    }

    async fn who_am_i(
        &self,
        cookie_header: Option<String>,
    ) -> Result<Option<Identity>, IdentityServiceError> {
        Ok(self
            .is_authenticated(cookie_header.as_deref())
            .then(|| self.identity.clone()))
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<LoginOutcome, IdentityServiceError> {
        if credentials.phone() == FIXTURE_PHONE && credentials.password() == FIXTURE_PASSWORD {
            Ok(LoginOutcome::Authenticated(self.tokens.clone()))
        } else {
            Ok(LoginOutcome::Rejected(vec![ValidationError::new(
                "password",
                ["Invalid phone number or password."],
            )]))
        }
    }

    async fn logout(&self, _cookie_header: Option<String>) -> Result<(), IdentityServiceError> {
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, IdentityServiceError> {
        Ok((refresh_token == self.tokens.refresh).then(|| self.tokens.clone()))
    }

    async fn request_phone_verification(
        &self,
        _request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError> {
        Ok(PhoneFlowOutcome::Accepted(Some(
            "Verification code sent.".to_owned(),
        )))
    }

    async fn forgot_password(
        &self,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError> {
        if request.phone() == FIXTURE_PHONE {
            Ok(PhoneFlowOutcome::Accepted(Some(
                "Password reset instructions sent.".to_owned(),
            )))
        } else {
            Ok(PhoneFlowOutcome::Rejected(vec![ValidationError::new(
                "phone",
                ["No account found with this phone number."],
            )]))
        }
    }
}
