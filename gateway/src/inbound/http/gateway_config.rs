//! Gateway configuration parsing and validation.
//!
//! This module centralises the environment-driven settings (backend URL,
//! token secret, cookie environment, gate strategy) so they are validated
//! consistently and can be tested in isolation with `mockable::MockEnv`.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::cookies::{CookiePolicy, Environment};
use crate::domain::tokens::TokenVerifier;
use crate::middleware::GateStrategy;

const API_URL_ENV: &str = "API_URL";
const PUBLIC_API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";
const SECRET_KEY_ENV: &str = "SECRET_KEY";
const APP_ENV_ENV: &str = "APP_ENV";
const GATE_STRATEGY_ENV: &str = "AUTH_GATE_STRATEGY";
const TIMEOUT_ENV: &str = "BACKEND_TIMEOUT_SECS";
const BIND_ADDR_ENV: &str = "BIND_ADDR";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEVELOPMENT_SECRET: &str = "insecure-development-secret";

const ENVIRONMENT_EXPECTED: &str = "development|production";
const STRATEGY_EXPECTED: &str = "probe|verify";
const TIMEOUT_EXPECTED: &str = "positive whole seconds";

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing values.
    Debug,
    /// Release builds require explicit, valid values.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gateway::inbound::http::gateway_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Which auth gate strategy to run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GateStrategyKind {
    /// Ask the backend on every request.
    IdentityProbe,
    /// Verify tokens locally and refresh once.
    #[default]
    TokenVerification,
}

/// Settings derived from the environment.
pub struct GatewaySettings {
    /// Practice backend base URL.
    pub api_url: Url,
    /// Shared HS256 secret for access tokens.
    pub secret_key: Zeroizing<String>,
    /// Deployment environment driving cookie attributes.
    pub environment: Environment,
    /// Auth gate strategy.
    pub strategy: GateStrategyKind,
    /// Outbound request timeout.
    pub backend_timeout: Duration,
    /// Listen address.
    pub bind_addr: SocketAddr,
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("api_url", &self.api_url.as_str())
            .field("secret_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("strategy", &self.strategy)
            .field("backend_timeout", &self.backend_timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl GatewaySettings {
    /// Cookie policy for the configured environment.
    #[must_use]
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::new(self.environment)
    }

    /// Middleware strategy, building the token verifier when needed.
    #[must_use]
    pub fn gate_strategy(&self) -> GateStrategy {
        match self.strategy {
            GateStrategyKind::IdentityProbe => GateStrategy::IdentityProbe,
            GateStrategyKind::TokenVerification => {
                GateStrategy::TokenVerification(TokenVerifier::new(&self.secret_key))
            }
        }
    }
}

/// Errors raised while validating gateway configuration.
#[derive(thiserror::Error, Debug)]
pub enum GatewayConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The backend URL could not be parsed.
    #[error("invalid backend URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Build gateway settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use gateway::inbound::http::gateway_config::{BuildMode, settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "API_URL" => Some("https://api.example.test".to_owned()),
///     "SECRET_KEY" => Some("s3cret".to_owned()),
///     "APP_ENV" => Some("production".to_owned()),
///     _ => None,
/// });
///
/// let settings = settings_from_env(&env, BuildMode::Release).expect("valid settings");
/// assert_eq!(settings.api_url.as_str(), "https://api.example.test/");
/// ```
pub fn settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<GatewaySettings, GatewayConfigError> {
    Ok(GatewaySettings {
        api_url: api_url_from_env(env, mode)?,
        secret_key: secret_key_from_env(env, mode)?,
        environment: environment_from_env(env, mode)?,
        strategy: strategy_from_env(env, mode)?,
        backend_timeout: timeout_from_env(env, mode)?,
        bind_addr: bind_addr_from_env(env)?,
    })
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn api_url_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Url, GatewayConfigError> {
    let value = match non_blank(env, API_URL_ENV).or_else(|| non_blank(env, PUBLIC_API_URL_ENV)) {
        Some(value) => value,
        None if mode.is_debug() => {
            warn!(default = DEFAULT_API_URL, "API_URL not set; using default");
            DEFAULT_API_URL.to_owned()
        }
        None => return Err(GatewayConfigError::MissingEnv { name: API_URL_ENV }),
    };
    Url::parse(&value).map_err(|source| GatewayConfigError::InvalidUrl { value, source })
}

fn secret_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<Zeroizing<String>, GatewayConfigError> {
    match env.string(SECRET_KEY_ENV).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Zeroizing::new(value)),
        None if mode.is_debug() => {
            warn!("SECRET_KEY not set; using insecure development secret");
            Ok(Zeroizing::new(DEVELOPMENT_SECRET.to_owned()))
        }
        None => Err(GatewayConfigError::MissingEnv {
            name: SECRET_KEY_ENV,
        }),
    }
}

fn environment_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<Environment, GatewayConfigError> {
    let Some(value) = non_blank(env, APP_ENV_ENV) else {
        if mode.is_debug() {
            return Ok(Environment::Development);
        }
        return Err(GatewayConfigError::MissingEnv { name: APP_ENV_ENV });
    };
    match value.parse() {
        Ok(environment) => Ok(environment),
        Err(_) if mode.is_debug() => {
            warn!(value = %value, "invalid APP_ENV; defaulting to development");
            Ok(Environment::Development)
        }
        Err(_) => Err(GatewayConfigError::InvalidEnv {
            name: APP_ENV_ENV,
            value,
            expected: ENVIRONMENT_EXPECTED,
        }),
    }
}

fn strategy_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<GateStrategyKind, GatewayConfigError> {
    let Some(value) = non_blank(env, GATE_STRATEGY_ENV) else {
        return Ok(GateStrategyKind::default());
    };
    match value.to_ascii_lowercase().as_str() {
        "probe" => Ok(GateStrategyKind::IdentityProbe),
        "verify" => Ok(GateStrategyKind::TokenVerification),
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid AUTH_GATE_STRATEGY; using verify");
            Ok(GateStrategyKind::default())
        }
        _ => Err(GatewayConfigError::InvalidEnv {
            name: GATE_STRATEGY_ENV,
            value,
            expected: STRATEGY_EXPECTED,
        }),
    }
}

fn timeout_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, GatewayConfigError> {
    let Some(value) = non_blank(env, TIMEOUT_ENV) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid BACKEND_TIMEOUT_SECS; using default");
            Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        }
        _ => Err(GatewayConfigError::InvalidEnv {
            name: TIMEOUT_ENV,
            value,
            expected: TIMEOUT_EXPECTED,
        }),
    }
}

fn bind_addr_from_env<E: Env>(env: &E) -> Result<SocketAddr, GatewayConfigError> {
    let value = non_blank(env, BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    value
        .parse()
        .map_err(|_| GatewayConfigError::InvalidEnv {
            name: BIND_ADDR_ENV,
            value,
            expected: "host:port socket address",
        })
}

#[cfg(test)]
mod tests;
