//! Identity service implemented against the backend's `/public/auth` API.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::domain::forms::ValidationError;
use crate::domain::ports::{
    ApiRequest, ApiResponse, BackendApi, IdentityService, IdentityServiceError, LoginOutcome,
    PhoneFlowOutcome, RequestBody, TokenPair,
};
use crate::domain::{GENERIC_FAILURE_MESSAGE, Identity, LoginCredentials, PhoneRequest};

const ME_PATH: &str = "/public/auth/me";
const LOGIN_PATH: &str = "/public/auth/login";
const LOGOUT_PATH: &str = "/public/auth/logout";
const REFRESH_PATH: &str = "/public/auth/token/refresh";
const PHONE_VERIFICATION_PATH: &str = "/public/auth/phone-verification";
const FORGOT_PASSWORD_PATH: &str = "/public/auth/forgot-password";

/// Identity use-cases over any [`BackendApi`].
#[derive(Clone)]
pub struct HttpIdentityService {
    api: Arc<dyn BackendApi>,
}

impl HttpIdentityService {
    /// Wrap a backend client.
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self { api }
    }

    async fn post_phone(
        &self,
        path: &str,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError> {
        let response = self
            .api
            .send(
                ApiRequest::post(path)
                    .with_body(RequestBody::Json(json!({ "phone": request.phone() }))),
            )
            .await?;
        if response.is_success() {
            Ok(PhoneFlowOutcome::Accepted(response.general_message()))
        } else {
            Ok(PhoneFlowOutcome::Rejected(rejection(&response)))
        }
    }
}

fn string_at(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn cookie_value(set_cookies: &[String], name: &str) -> Option<String> {
    set_cookies
        .iter()
        .filter_map(|raw| Cookie::parse(raw.as_str()).ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Tokens from the body (`access`/`access_token`, `refresh`/`refresh_token`,
/// possibly under `data`) or, failing that, from the backend's cookies.
fn issued_tokens(response: &ApiResponse) -> Option<TokenPair> {
    let body = response.payload();
    let access = string_at(body, &["access", "access_token"])
        .or_else(|| cookie_value(&response.set_cookies, ACCESS_TOKEN_COOKIE))?;
    let refresh = string_at(body, &["refresh", "refresh_token"])
        .or_else(|| cookie_value(&response.set_cookies, REFRESH_TOKEN_COOKIE))?;
    Some(TokenPair { access, refresh })
}

/// Field errors from a rejection, falling back to one form-level message.
fn rejection(response: &ApiResponse) -> Vec<ValidationError> {
    let errors = response.validation_errors();
    if errors.is_empty() {
        let message = response
            .general_message()
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned());
        vec![ValidationError::new("non_field_errors", [message])]
    } else {
        errors
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn probe(&self, cookie_header: Option<String>) -> Result<bool, IdentityServiceError> {
        let response = self
            .api
            .send(ApiRequest::get(ME_PATH).with_cookies(cookie_header.as_deref()))
            .await?;
        Ok(response.status == 200)
    }

    async fn who_am_i(
        &self,
        cookie_header: Option<String>,
    ) -> Result<Option<Identity>, IdentityServiceError> {
        let response = self
            .api
            .send(ApiRequest::get(ME_PATH).with_cookies(cookie_header.as_deref()))
            .await?;
        if response.status != 200 {
            return Ok(None);
        }
        Identity::from_me_body(response.payload())
            .map(Some)
            .map_err(|error| IdentityServiceError::decode(error.to_string()))
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<LoginOutcome, IdentityServiceError> {
        let response = self
            .api
            .send(
                ApiRequest::post(LOGIN_PATH)
                    .with_body(RequestBody::Form(credentials.form_fields())),
            )
            .await?;
        if response.status != 200 {
            return Ok(LoginOutcome::Rejected(rejection(&response)));
        }
        issued_tokens(&response)
            .map(LoginOutcome::Authenticated)
            .ok_or_else(|| IdentityServiceError::decode("login response carried no tokens"))
    }

    async fn logout(&self, cookie_header: Option<String>) -> Result<(), IdentityServiceError> {
        self.api
            .send(ApiRequest::post(LOGOUT_PATH).with_cookies(cookie_header.as_deref()))
            .await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, IdentityServiceError> {
        let response = self
            .api
            .send(
                ApiRequest::post(REFRESH_PATH)
                    .with_body(RequestBody::Json(json!({ "refresh": refresh_token }))),
            )
            .await?;
        if response.status != 200 {
            return Ok(None);
        }
        let body = response.payload();
        let access = string_at(body, &["access", "access_token"])
            .or_else(|| cookie_value(&response.set_cookies, ACCESS_TOKEN_COOKIE));
        Ok(access.map(|access| TokenPair {
            access,
            refresh: string_at(body, &["refresh", "refresh_token"])
                .or_else(|| cookie_value(&response.set_cookies, REFRESH_TOKEN_COOKIE))
                .unwrap_or_else(|| refresh_token.to_owned()),
        }))
    }

    async fn request_phone_verification(
        &self,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError> {
        self.post_phone(PHONE_VERIFICATION_PATH, request).await
    }

    async fn forgot_password(
        &self,
        request: &PhoneRequest,
    ) -> Result<PhoneFlowOutcome, IdentityServiceError> {
        self.post_phone(FORGOT_PASSWORD_PATH, request).await
    }
}
