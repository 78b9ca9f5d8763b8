//! Domain primitives, policies and ports.
//!
//! Purpose: model what the gateway knows about the practice backend without
//! depending on how it is reached. Inbound adapters translate HTTP into these
//! types; outbound adapters implement the ports.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - AuthContext: per-request authentication state.
//! - FormConfig: declarative forms and their submission engine.
//! - CookiePolicy / TokenVerifier / access: the auth gate's building blocks.

pub mod access;
pub mod auth;
pub mod cookies;
pub mod error;
pub mod formatting;
pub mod forms;
pub mod ports;
pub mod resources;
pub mod session;
pub mod tokens;
pub mod trace_id;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError, PASSWORD_MIN_LEN, PhoneRequest};
pub use self::error::{Error, ErrorCode, ErrorValidationError, GENERIC_FAILURE_MESSAGE};
pub use self::session::{AuthContext, AuthState, LoginResult, LogoutResult};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Identity, Role, UserProfile};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use gateway::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
