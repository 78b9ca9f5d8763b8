//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use actix_web::HttpRequest;
use actix_web::http::header::COOKIE;

use crate::domain::AuthContext;
use crate::domain::cookies::CookiePolicy;
use crate::domain::ports::{BackendApi, IdentityService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Identity use-cases (login, logout, who am I).
    pub identity: Arc<dyn IdentityService>,
    /// Raw backend client for resources and forms.
    pub backend: Arc<dyn BackendApi>,
    /// Cookie attributes for the deployment environment.
    pub cookies: CookiePolicy,
}

impl HttpState {
    /// Construct state from its ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use gateway::domain::cookies::CookiePolicy;
    /// use gateway::domain::ports::{BackendApi, IdentityService};
    /// use gateway::inbound::http::state::HttpState;
    ///
    /// fn build(identity: Arc<dyn IdentityService>, backend: Arc<dyn BackendApi>) -> HttpState {
    ///     HttpState::new(identity, backend, CookiePolicy::default())
    /// }
    /// ```
    pub fn new(
        identity: Arc<dyn IdentityService>,
        backend: Arc<dyn BackendApi>,
        cookies: CookiePolicy,
    ) -> Self {
        Self {
            identity,
            backend,
            cookies,
        }
    }

    /// Fresh, anonymous auth context for one request.
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(Arc::clone(&self.identity), self.cookies)
    }
}

/// Raw `Cookie` header of the incoming request, forwarded to the backend.
pub(crate) fn cookie_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
