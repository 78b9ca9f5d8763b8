//! Session cookie policy.
//!
//! Three cookies carry the session: `access_token`, `refresh_token` and
//! `remember_me`. All are `HttpOnly` with path `/`; `Secure` and `SameSite`
//! follow the deployment environment and lifetimes follow the remember-me
//! choice made at login.

use std::fmt;
use std::str::FromStr;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};

use super::ports::TokenPair;

/// Name of the short-lived access token cookie.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Name of the refresh token cookie.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Name of the cookie remembering the login's remember-me choice.
pub const REMEMBER_ME_COOKIE: &str = "remember_me";

/// Deployment environment, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development over plain HTTP.
    #[default]
    Development,
    /// Deployed behind HTTPS.
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}

/// Error returned for unrecognised `APP_ENV` values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(UnknownEnvironment(s.to_owned())),
        }
    }
}

/// Builds session cookies for one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookiePolicy {
    environment: Environment,
}

impl CookiePolicy {
    /// Policy for `environment`.
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    /// Environment the policy targets.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Access token lifetime.
    pub fn access_max_age(remember_me: bool) -> CookieDuration {
        if remember_me {
            CookieDuration::hours(24)
        } else {
            CookieDuration::minutes(15)
        }
    }

    /// Refresh token lifetime.
    pub fn refresh_max_age(remember_me: bool) -> CookieDuration {
        if remember_me {
            CookieDuration::days(7)
        } else {
            CookieDuration::days(1)
        }
    }

    fn base(&self, name: &'static str, value: String) -> Cookie<'static> {
        let production = self.environment == Environment::Production;
        Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .secure(production)
            .same_site(if production {
                SameSite::None
            } else {
                SameSite::Lax
            })
            .finish()
    }

    /// Cookie carrying the access token.
    pub fn access_cookie(&self, token: &str, remember_me: bool) -> Cookie<'static> {
        let mut cookie = self.base(ACCESS_TOKEN_COOKIE, token.to_owned());
        cookie.set_max_age(Self::access_max_age(remember_me));
        cookie
    }

    /// Cookie carrying the refresh token.
    pub fn refresh_cookie(&self, token: &str, remember_me: bool) -> Cookie<'static> {
        let mut cookie = self.base(REFRESH_TOKEN_COOKIE, token.to_owned());
        cookie.set_max_age(Self::refresh_max_age(remember_me));
        cookie
    }

    /// Cookie recording the remember-me choice so refreshes keep lifetimes.
    pub fn remember_cookie(&self, remember_me: bool) -> Cookie<'static> {
        let mut cookie = self.base(REMEMBER_ME_COOKIE, remember_me.to_string());
        cookie.set_max_age(Self::refresh_max_age(remember_me));
        cookie
    }

    /// The three cookies written after login or refresh.
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::cookies::{CookiePolicy, Environment};
    /// use gateway::domain::ports::TokenPair;
    ///
    /// let policy = CookiePolicy::new(Environment::Development);
    /// let tokens = TokenPair { access: "a".into(), refresh: "r".into() };
    /// let cookies = policy.session_cookies(&tokens, true);
    /// assert_eq!(cookies.len(), 3);
    /// ```
    pub fn session_cookies(&self, tokens: &TokenPair, remember_me: bool) -> Vec<Cookie<'static>> {
        vec![
            self.access_cookie(&tokens.access, remember_me),
            self.refresh_cookie(&tokens.refresh, remember_me),
            self.remember_cookie(remember_me),
        ]
    }

    /// Expired cookies that remove the session from the browser.
    pub fn removal_cookies(&self) -> Vec<Cookie<'static>> {
        [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, REMEMBER_ME_COOKIE]
            .into_iter()
            .map(|name| {
                let mut cookie = self.base(name, String::new());
                cookie.make_removal();
                cookie
            })
            .collect()
    }
}
