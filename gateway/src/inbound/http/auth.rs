//! Auth API handlers.
//!
//! ```text
//! POST /api/v1/auth/login {"phone":"01712345678","password":"password123","rememberMe":true}
//! POST /api/v1/auth/logout
//! GET /api/v1/auth/me
//! POST /api/v1/auth/phone-verification {"phone":"01712345678"}
//! POST /api/v1/auth/forgot-password {"phone":"01712345678"}
//! ```

use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::PhoneFlowOutcome;
use crate::domain::resources::Organization;
use crate::domain::{
    AuthState, Error, Identity, LoginResult, LoginValidationError, PhoneRequest, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, OrganizationSchema, UserProfileSchema};
use crate::inbound::http::state::{HttpState, cookie_header};

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Mobile number in any accepted format.
    pub phone: String,
    /// Plain-text password.
    pub password: String,
    /// Keep the session cookies beyond the browser session.
    #[serde(default)]
    pub remember_me: bool,
}

/// Body for the phone-only flows.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PhoneFlowRequest {
    /// Mobile number in any accepted format.
    pub phone: String,
}

/// Current session as seen by clients.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Logged-in user, absent when no session.
    #[schema(value_type = Option<UserProfileSchema>)]
    pub user: Option<UserProfile>,
    /// Organisation the user belongs to, if any.
    #[schema(value_type = Option<OrganizationSchema>)]
    pub organization: Option<Organization>,
}

impl From<Option<Identity>> for SessionResponse {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(Identity { user, organization }) => Self {
                user: Some(user),
                organization,
            },
            None => Self {
                user: None,
                organization: None,
            },
        }
    }
}

/// Where the client goes after logging out.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    /// Client route to navigate to.
    pub redirect: String,
}

/// Confirmation from a phone flow.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Backend confirmation, when it sent one.
    pub message: Option<String>,
}

fn with_cookies(
    mut builder: HttpResponseBuilder,
    cookies: Vec<Cookie<'static>>,
) -> HttpResponseBuilder {
    for cookie in cookies {
        builder.cookie(cookie);
    }
    builder
}

fn phone_validation_error(err: &LoginValidationError) -> Error {
    Error::field_errors(err.to_string(), &[err.to_validation_error()])
}

/// Validate credentials, log in against the backend and set session cookies.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SessionResponse,
            headers(("Set-Cookie" = String, description = "access_token, refresh_token and remember_me cookies"))),
        (status = 400, description = "Validation or backend rejection", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest {
        phone,
        password,
        remember_me,
    } = payload.into_inner();
    let mut context = state.auth_context();
    match context.login(&phone, &password, remember_me).await? {
        LoginResult::Rejected(errors) => Err(Error::field_errors("Login failed.", &errors)),
        LoginResult::Authenticated { identity, cookies } => {
            Ok(with_cookies(HttpResponse::Ok(), cookies).json(SessionResponse::from(identity)))
        }
    }
}

/// End the session; cookies are cleared whatever the backend answers.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = LogoutResponse)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(state: web::Data<HttpState>, req: HttpRequest) -> HttpResponse {
    let mut context = state.auth_context();
    let result = context.logout(cookie_header(&req).as_deref()).await;
    with_cookies(HttpResponse::Ok(), result.cookies).json(LogoutResponse {
        redirect: result.redirect.to_owned(),
    })
}

/// Resolve the current user and organisation from the forwarded cookies.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentSession"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    req: HttpRequest,
) -> ApiResult<web::Json<SessionResponse>> {
    let mut context = state.auth_context();
    match context.check_auth(cookie_header(&req).as_deref()).await? {
        AuthState::Authenticated(identity) => {
            Ok(web::Json(SessionResponse::from(Some(identity.clone()))))
        }
        AuthState::Anonymous => Err(Error::unauthorized("login required")),
    }
}

fn phone_flow_response(outcome: PhoneFlowOutcome) -> ApiResult<web::Json<MessageResponse>> {
    match outcome {
        PhoneFlowOutcome::Accepted(message) => Ok(web::Json(MessageResponse { message })),
        PhoneFlowOutcome::Rejected(errors) => {
            Err(Error::field_errors("Request rejected.", &errors))
        }
    }
}

/// Start phone-number verification.
#[utoipa::path(
    post,
    path = "/api/v1/auth/phone-verification",
    request_body = PhoneFlowRequest,
    responses(
        (status = 200, description = "Verification started", body = MessageResponse),
        (status = 400, description = "Invalid phone number", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "phoneVerification",
    security([])
)]
#[post("/auth/phone-verification")]
pub async fn phone_verification(
    state: web::Data<HttpState>,
    payload: web::Json<PhoneFlowRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let request =
        PhoneRequest::try_new(&payload.phone).map_err(|err| phone_validation_error(&err))?;
    phone_flow_response(state.identity.request_phone_verification(&request).await?)
}

/// Start the forgot-password flow.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = PhoneFlowRequest,
    responses(
        (status = 200, description = "Reset instructions sent", body = MessageResponse),
        (status = 400, description = "Invalid or unknown phone number", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<PhoneFlowRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let request =
        PhoneRequest::try_new(&payload.phone).map_err(|err| phone_validation_error(&err))?;
    phone_flow_response(state.identity.forgot_password(&request).await?)
}

#[cfg(test)]
mod tests {
    //! Handler coverage against mocked identity ports.
    use super::*;
    use crate::domain::ports::{IdentityServiceError, LoginOutcome, MockIdentityService, TokenPair};
    use crate::domain::{ErrorCode, Role};
    use crate::inbound::http::test_utils::{fixture_identity, test_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn call(
        identity: MockIdentityService,
        req: actix_test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(identity)))
                .service(web::scope("/api/v1").configure(crate::inbound::http::configure_api)),
        )
        .await;
        actix_test::call_service(&app, req.to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn short_password_fails_before_network() {
        let mut identity = MockIdentityService::new();
        identity.expect_login().never();
        let res = call(
            identity,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({"phone": "01712345678", "password": "short"})),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Error = actix_test::read_body_json(res).await;
        assert_eq!(body.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            body.details(),
            Some(&json!({"fieldErrors": {"password": ["Password must be at least 8 characters."]}}))
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn login_sets_cookies_and_returns_identity() {
        let mut identity = MockIdentityService::new();
        identity.expect_login().times(1).return_once(|_| {
            Ok(LoginOutcome::Authenticated(TokenPair {
                access: "acc".to_owned(),
                refresh: "ref".to_owned(),
            }))
        });
        identity
            .expect_who_am_i()
            .withf(|header| header.as_deref() == Some("access_token=acc; refresh_token=ref"))
            .times(1)
            .return_once(|_| Ok(Some(fixture_identity())));

        let res = call(
            identity,
            actix_test::TestRequest::post().uri("/api/v1/auth/login").set_json(json!({
                "phone": "01712345678",
                "password": "password123",
                "rememberMe": true
            })),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let names: Vec<String> = res
            .response()
            .cookies()
            .map(|cookie| cookie.name().to_owned())
            .collect();
        assert_eq!(names, ["access_token", "refresh_token", "remember_me"]);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["user"]["role"], json!("owner"));
    }

    #[rstest]
    #[actix_web::test]
    async fn backend_rejection_is_reported_per_field() {
        let mut identity = MockIdentityService::new();
        identity.expect_login().times(1).return_once(|_| {
            Ok(LoginOutcome::Rejected(vec![crate::domain::forms::ValidationError::new(
                "phone",
                ["Invalid phone number."],
            )]))
        });
        let res = call(
            identity,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({"phone": "01712345678", "password": "password123"})),
        )
        .await;
        let body: Error = actix_test::read_body_json(res).await;
        assert_eq!(
            body.details(),
            Some(&json!({"fieldErrors": {"phone": ["Invalid phone number."]}}))
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_clears_cookies_even_when_backend_fails() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_logout()
            .times(1)
            .return_once(|_| Err(IdentityServiceError::unavailable("down")));
        let res = call(
            identity,
            actix_test::TestRequest::post().uri("/api/v1/auth/logout"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.response().cookies().all(|cookie| cookie.value().is_empty()));
        let body: LogoutResponse = actix_test::read_body_json(res).await;
        assert_eq!(body.redirect, "/login");
    }

    #[rstest]
    #[case(Ok(None), StatusCode::UNAUTHORIZED)]
    #[case(Err(IdentityServiceError::unavailable("down")), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn me_maps_failures(
        #[case] answer: Result<Option<Identity>, IdentityServiceError>,
        #[case] status: StatusCode,
    ) {
        let mut identity = MockIdentityService::new();
        identity.expect_who_am_i().times(1).return_once(move |_| answer);
        let res = call(identity, actix_test::TestRequest::get().uri("/api/v1/auth/me")).await;
        assert_eq!(res.status(), status);
    }

    #[rstest]
    #[actix_web::test]
    async fn me_returns_user_and_organisation() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_who_am_i()
            .times(1)
            .return_once(|_| Ok(Some(fixture_identity())));
        let res = call(
            identity,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .insert_header(("Cookie", "access_token=acc")),
        )
        .await;
        let body: SessionResponse = actix_test::read_body_json(res).await;
        assert_eq!(body.user.map(|user| user.role), Some(Role::Owner));
        assert_eq!(body.organization.map(|org| org.uid).as_deref(), Some("org-1"));
    }

    #[rstest]
    #[actix_web::test]
    async fn forgot_password_validates_phone_locally() {
        let mut identity = MockIdentityService::new();
        identity.expect_forgot_password().never();
        let res = call(
            identity,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/forgot-password")
                .set_json(json!({"phone": "12345"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn phone_verification_passes_backend_message() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_request_phone_verification()
            .withf(|request| request.phone() == "01712345678")
            .times(1)
            .return_once(|_| Ok(PhoneFlowOutcome::Accepted(Some("Code sent.".to_owned()))));
        let res = call(
            identity,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/phone-verification")
                .set_json(json!({"phone": "+8801712345678"})),
        )
        .await;
        let body: MessageResponse = actix_test::read_body_json(res).await;
        assert_eq!(body.message.as_deref(), Some("Code sent."));
    }
}
