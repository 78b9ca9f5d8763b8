//! Per-request authentication context.
//!
//! [`AuthContext`] owns the current user and organisation for one request.
//! Only [`AuthContext::check_auth`], [`AuthContext::login`] and
//! [`AuthContext::logout`] change that state.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use tracing::warn;

use super::access::LOGIN_PATH;
use super::cookies::{ACCESS_TOKEN_COOKIE, CookiePolicy, REFRESH_TOKEN_COOKIE};
use super::forms::ValidationError;
use super::ports::{IdentityService, IdentityServiceError, LoginOutcome, TokenPair};
use super::resources::Organization;
use super::user::{Identity, UserProfile};
use super::LoginCredentials;

/// Authentication state held by the context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No verified session.
    #[default]
    Anonymous,
    /// Session verified for this identity.
    Authenticated(Identity),
}

/// Result of [`AuthContext::login`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginResult {
    /// Login succeeded; write `cookies` on the response.
    Authenticated {
        identity: Option<Identity>,
        cookies: Vec<Cookie<'static>>,
    },
    /// Validation or the backend rejected the login.
    Rejected(Vec<ValidationError>),
}

/// Result of [`AuthContext::logout`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogoutResult {
    /// Client route to navigate to afterwards.
    pub redirect: &'static str,
    /// Expired cookies that clear the session.
    pub cookies: Vec<Cookie<'static>>,
}

/// Request-scoped authentication context.
pub struct AuthContext {
    identity: Arc<dyn IdentityService>,
    cookies: CookiePolicy,
    state: AuthState,
}

fn session_cookie_header(tokens: &TokenPair) -> String {
    format!(
        "{ACCESS_TOKEN_COOKIE}={}; {REFRESH_TOKEN_COOKIE}={}",
        tokens.access, tokens.refresh
    )
}

impl AuthContext {
    /// Anonymous context backed by `identity`.
    pub fn new(identity: Arc<dyn IdentityService>, cookies: CookiePolicy) -> Self {
        Self {
            identity,
            cookies,
            state: AuthState::Anonymous,
        }
    }

    /// Current state.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Authenticated user, if any.
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            AuthState::Authenticated(identity) => Some(&identity.user),
            AuthState::Anonymous => None,
        }
    }

    /// Organisation of the authenticated user, if any.
    pub fn organization(&self) -> Option<&Organization> {
        match &self.state {
            AuthState::Authenticated(identity) => identity.organization.as_ref(),
            AuthState::Anonymous => None,
        }
    }

    /// Ask the backend who owns `cookie_header` and record the answer.
    ///
    /// Anything but a recognised identity clears the state. Transport
    /// failures clear the state and are returned to the caller.
    pub async fn check_auth(
        &mut self,
        cookie_header: Option<&str>,
    ) -> Result<&AuthState, IdentityServiceError> {
        match self.identity.who_am_i(cookie_header.map(str::to_owned)).await {
            Ok(Some(identity)) => self.state = AuthState::Authenticated(identity),
            Ok(None) => self.state = AuthState::Anonymous,
            Err(error) => {
                self.state = AuthState::Anonymous;
                return Err(error);
            }
        }
        Ok(&self.state)
    }

    /// Validate and submit credentials.
    ///
    /// Shape validation runs before any network call. On success the issued
    /// tokens become session cookies and the identity is re-read with them.
    pub async fn login(
        &mut self,
        phone: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginResult, IdentityServiceError> {
        let credentials = match LoginCredentials::try_from_parts(phone, password, remember_me) {
            Ok(credentials) => credentials,
            Err(error) => return Ok(LoginResult::Rejected(vec![error.to_validation_error()])),
        };

        match self.identity.login(&credentials).await? {
            LoginOutcome::Rejected(errors) => {
                self.state = AuthState::Anonymous;
                Ok(LoginResult::Rejected(errors))
            }
            LoginOutcome::Authenticated(tokens) => {
                let cookies = self
                    .cookies
                    .session_cookies(&tokens, credentials.remember_me());
                let header = session_cookie_header(&tokens);
                let identity = match self.check_auth(Some(header.as_str())).await {
                    Ok(AuthState::Authenticated(identity)) => Some(identity.clone()),
                    Ok(AuthState::Anonymous) => None,
                    Err(error) => {
                        warn!(%error, "identity lookup after login failed");
                        None
                    }
                };
                Ok(LoginResult::Authenticated { identity, cookies })
            }
        }
    }

    /// End the session.
    ///
    /// The backend is told to invalidate the session, but local state is
    /// cleared and the redirect issued whatever it answers.
    pub async fn logout(&mut self, cookie_header: Option<&str>) -> LogoutResult {
        if let Err(error) = self.identity.logout(cookie_header.map(str::to_owned)).await {
            warn!(%error, "backend logout failed; clearing local session anyway");
        }
        self.state = AuthState::Anonymous;
        LogoutResult {
            redirect: LOGIN_PATH,
            cookies: self.cookies.removal_cookies(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::MockIdentityService;
    use actix_web::cookie::time::Duration as CookieDuration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn identity() -> Identity {
        Identity {
            user: UserProfile {
                id: "7".to_owned(),
                phone: "01712345678".to_owned(),
                name: "Dr. Karim".to_owned(),
                is_admin: false,
                role: Role::Owner,
            },
            organization: None,
        }
    }

    fn tokens() -> TokenPair {
        TokenPair {
            access: "acc".to_owned(),
            refresh: "ref".to_owned(),
        }
    }

    fn context(mock: MockIdentityService) -> AuthContext {
        AuthContext::new(Arc::new(mock), CookiePolicy::default())
    }

    #[rstest]
    #[tokio::test]
    async fn short_password_fails_before_network() {
        let mut mock = MockIdentityService::new();
        mock.expect_login().never();
        mock.expect_who_am_i().never();
        let mut ctx = context(mock);

        let result = ctx.login("01712345678", "short", false).await.expect("login");

        let LoginResult::Rejected(errors) = result else {
            panic!("expected rejection");
        };
        assert_eq!(
            errors,
            vec![ValidationError::new(
                "password",
                ["Password must be at least 8 characters."]
            )]
        );
        assert_eq!(ctx.state(), &AuthState::Anonymous);
    }

    #[rstest]
    #[case(true, CookieDuration::days(7))]
    #[case(false, CookieDuration::days(1))]
    #[tokio::test]
    async fn login_writes_remember_aware_cookies(
        identity: Identity,
        #[case] remember: bool,
        #[case] refresh_age: CookieDuration,
    ) {
        let mut mock = MockIdentityService::new();
        mock.expect_login()
            .times(1)
            .return_once(|_| Ok(LoginOutcome::Authenticated(tokens())));
        let expected = identity.clone();
        mock.expect_who_am_i()
            .withf(|header| header.as_deref() == Some("access_token=acc; refresh_token=ref"))
            .times(1)
            .return_once(move |_| Ok(Some(expected)));
        let mut ctx = context(mock);

        let result = ctx
            .login("01712345678", "password123", remember)
            .await
            .expect("login");

        let LoginResult::Authenticated {
            identity: found,
            cookies,
        } = result
        else {
            panic!("expected success");
        };
        assert_eq!(found, Some(identity.clone()));
        let refresh = cookies
            .iter()
            .find(|cookie| cookie.name() == REFRESH_TOKEN_COOKIE)
            .expect("refresh cookie");
        assert_eq!(refresh.max_age(), Some(refresh_age));
        assert_eq!(ctx.user(), Some(&identity.user));
    }

    #[rstest]
    #[tokio::test]
    async fn backend_rejection_returns_field_errors() {
        let mut mock = MockIdentityService::new();
        mock.expect_login().times(1).return_once(|_| {
            Ok(LoginOutcome::Rejected(vec![ValidationError::new(
                "phone",
                ["Invalid phone number."],
            )]))
        });
        let mut ctx = context(mock);

        let result = ctx
            .login("01712345678", "password123", false)
            .await
            .expect("login");

        assert_eq!(
            result,
            LoginResult::Rejected(vec![ValidationError::new(
                "phone",
                ["Invalid phone number."]
            )])
        );
    }

    #[rstest]
    #[tokio::test]
    async fn check_auth_clears_state_on_non_identity(identity: Identity) {
        let mut mock = MockIdentityService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_who_am_i()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(Some(identity)));
        mock.expect_who_am_i()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(None));
        let mut ctx = context(mock);

        ctx.check_auth(Some("access_token=acc")).await.expect("first");
        assert!(ctx.user().is_some());
        ctx.check_auth(Some("access_token=acc")).await.expect("second");
        assert_eq!(ctx.state(), &AuthState::Anonymous);
    }

    #[rstest]
    #[tokio::test]
    async fn logout_clears_even_when_backend_fails() {
        let mut mock = MockIdentityService::new();
        mock.expect_logout()
            .times(1)
            .return_once(|_| Err(IdentityServiceError::unavailable("down")));
        let mut ctx = context(mock);

        let result = ctx.logout(Some("access_token=acc")).await;

        assert_eq!(result.redirect, "/login");
        assert_eq!(result.cookies.len(), 3);
        assert_eq!(ctx.state(), &AuthState::Anonymous);
    }
}
