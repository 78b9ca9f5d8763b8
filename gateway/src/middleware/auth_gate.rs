//! Authentication gate wrapped around every non-public route.
//!
//! Two strategies are available:
//!
//! - [`GateStrategy::IdentityProbe`] forwards the raw `Cookie` header to the
//!   backend's "who am I" endpoint and only inspects the status.
//! - [`GateStrategy::TokenVerification`] verifies the `access_token` cookie
//!   locally, attempts one refresh with the `refresh_token` cookie when it is
//!   missing or invalid, then applies the role checks in
//!   [`crate::domain::access`].
//!
//! Every failure ends in a `302` redirect to `/login` or `/unauthorized`.
//! Verified claims are stored in the request extensions and exposed to
//! handlers through [`AuthenticatedUser`].

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{COOKIE, HeaderValue, LOCATION, SET_COOKIE};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};

use crate::domain::Error as ApiError;
use crate::domain::access::{GateDecision, authorize, is_public_path};
use crate::domain::cookies::{
    ACCESS_TOKEN_COOKIE, CookiePolicy, REFRESH_TOKEN_COOKIE, REMEMBER_ME_COOKIE,
};
use crate::domain::ports::{IdentityService, TokenPair};
use crate::domain::tokens::{Claims, TokenVerifier};

/// How the gate decides whether a request is authenticated.
#[derive(Debug, Clone)]
pub enum GateStrategy {
    /// Ask the backend on every request; no local decoding, no role checks.
    IdentityProbe,
    /// Verify tokens locally, refresh once, then check roles.
    TokenVerification(TokenVerifier),
}

/// Claims of the user the gate let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        ready(
            claims
                .map(AuthenticatedUser)
                .ok_or_else(|| ApiError::unauthorized("login required").into()),
        )
    }
}

/// What the gate concluded about one request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GateOutcome {
    /// Whether the request proceeds or is redirected.
    pub decision: GateDecision,
    /// Verified claims, inserted into request extensions when allowed.
    pub claims: Option<Claims>,
    /// Tokens issued by a refresh, with the remember-me flag they were
    /// issued under.
    pub refreshed: Option<(TokenPair, bool)>,
}

impl GateOutcome {
    fn redirect_login() -> Self {
        Self {
            decision: GateDecision::RedirectLogin,
            claims: None,
            refreshed: None,
        }
    }
}

struct GateState {
    strategy: GateStrategy,
    identity: Arc<dyn IdentityService>,
    cookies: CookiePolicy,
}

/// Authentication gate middleware factory.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use actix_web::App;
/// use gateway::domain::cookies::CookiePolicy;
/// use gateway::domain::ports::{FixtureIdentityService, IdentityService};
/// use gateway::middleware::{AuthGate, GateStrategy};
///
/// fn build(identity: Arc<dyn IdentityService>) {
///     let _app = App::new().wrap(AuthGate::new(
///         GateStrategy::IdentityProbe,
///         identity,
///         CookiePolicy::default(),
///     ));
/// }
/// ```
#[derive(Clone)]
pub struct AuthGate {
    state: Rc<GateState>,
}

impl AuthGate {
    /// Build a gate using `strategy`.
    pub fn new(
        strategy: GateStrategy,
        identity: Arc<dyn IdentityService>,
        cookies: CookiePolicy,
    ) -> Self {
        Self {
            state: Rc::new(GateState {
                strategy,
                identity,
                cookies,
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            state: Rc::clone(&self.state),
        }))
    }
}

/// Service wrapper produced by [`AuthGate`].
pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    state: Rc<GateState>,
}

fn cookie_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

fn raw_cookie_header(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Replace the token pairs in a `Cookie` header so handlers forward the
/// refreshed session to the backend.
fn rewrite_cookie_header(original: Option<&str>, tokens: &TokenPair) -> String {
    let mut pairs: Vec<String> = original
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            name != ACCESS_TOKEN_COOKIE && name != REFRESH_TOKEN_COOKIE
        })
        .map(str::to_owned)
        .collect();
    pairs.push(format!("{ACCESS_TOKEN_COOKIE}={}", tokens.access));
    pairs.push(format!("{REFRESH_TOKEN_COOKIE}={}", tokens.refresh));
    pairs.join("; ")
}

impl GateState {
    async fn evaluate(&self, req: &ServiceRequest) -> GateOutcome {
        match &self.strategy {
            GateStrategy::IdentityProbe => self.probe(req).await,
            GateStrategy::TokenVerification(verifier) => self.verify(req, verifier).await,
        }
    }

    async fn probe(&self, req: &ServiceRequest) -> GateOutcome {
        match self.identity.probe(raw_cookie_header(req)).await {
            Ok(true) => GateOutcome {
                decision: GateDecision::Allowed,
                claims: None,
                refreshed: None,
            },
            Ok(false) => GateOutcome::redirect_login(),
            Err(error) => {
                warn!(%error, "identity probe failed; treating as unauthenticated");
                GateOutcome::redirect_login()
            }
        }
    }

    async fn verify(&self, req: &ServiceRequest, verifier: &TokenVerifier) -> GateOutcome {
        let path = req.path();
        if let Some(access) = cookie_value(req, ACCESS_TOKEN_COOKIE) {
            match verifier.verify(&access) {
                Ok(claims) => {
                    return GateOutcome {
                        decision: authorize(path, &claims),
                        claims: Some(claims),
                        refreshed: None,
                    };
                }
                Err(error) => debug!(%error, "access token rejected; attempting refresh"),
            }
        }

        let Some(refresh_token) = cookie_value(req, REFRESH_TOKEN_COOKIE) else {
            return GateOutcome::redirect_login();
        };
        let tokens = match self.identity.refresh(&refresh_token).await {
            Ok(Some(tokens)) => tokens,
            Ok(None) => return GateOutcome::redirect_login(),
            Err(error) => {
                warn!(%error, "token refresh failed; treating as unauthenticated");
                return GateOutcome::redirect_login();
            }
        };
        let claims = match verifier.verify(&tokens.access) {
            Ok(claims) => claims,
            Err(error) => {
                warn!(%error, "refreshed access token failed verification");
                return GateOutcome::redirect_login();
            }
        };
        let remember_me = cookie_value(req, REMEMBER_ME_COOKIE).as_deref() == Some("true");
        GateOutcome {
            decision: authorize(path, &claims),
            claims: Some(claims),
            refreshed: Some((tokens, remember_me)),
        }
    }

    fn session_cookies(&self, refreshed: Option<&(TokenPair, bool)>) -> Vec<Cookie<'static>> {
        refreshed
            .map(|(tokens, remember_me)| self.cookies.session_cookies(tokens, *remember_me))
            .unwrap_or_default()
    }
}

fn append_cookies<B>(res: &mut ServiceResponse<B>, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                res.headers_mut().append(SET_COOKIE, value);
            }
            Err(error) => warn!(%error, cookie = cookie.name(), "failed to encode cookie"),
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let state = Rc::clone(&self.state);
        Box::pin(async move {
            if is_public_path(req.path()) {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }

            let outcome = state.evaluate(&req).await;
            let cookies = state.session_cookies(outcome.refreshed.as_ref());

            if let Some(location) = outcome.decision.location() {
                debug!(path = req.path(), location, "auth gate redirect");
                let mut res = req
                    .into_response(
                        HttpResponse::Found()
                            .insert_header((LOCATION, location))
                            .finish(),
                    )
                    .map_into_right_body();
                append_cookies(&mut res, &cookies);
                return Ok(res);
            }

            let mut req = req;
            if let Some((tokens, _)) = &outcome.refreshed {
                let header = rewrite_cookie_header(raw_cookie_header(&req).as_deref(), tokens);
                match HeaderValue::from_str(&header) {
                    Ok(value) => {
                        req.headers_mut().insert(COOKIE, value);
                    }
                    Err(error) => warn!(%error, "failed to rewrite cookie header"),
                }
            }
            if let Some(claims) = outcome.claims {
                req.extensions_mut().insert(claims);
            }

            let mut res = service.call(req).await?.map_into_left_body();
            append_cookies(&mut res, &cookies);
            Ok(res)
        })
    }
}
