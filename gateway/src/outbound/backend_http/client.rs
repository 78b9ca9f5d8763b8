//! Reqwest-backed practice backend client.
//!
//! This adapter owns transport details only: URL assembly, body encoding,
//! cookie and trace forwarding, timeout mapping and lenient JSON decoding.
//! Status codes are returned to callers untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{
    ApiRequest, ApiResponse, BackendApi, BackendApiError, HttpMethod, MultipartPart, PartValue,
    RequestBody,
};
use crate::domain::{TRACE_ID_HEADER, TraceId};

const USER_AGENT: &str = "practice-gateway/0.1";

/// Backend client sending every request relative to one base URL.
#[derive(Debug, Clone)]
pub struct ReqwestBackendApi {
    client: Client,
    base_url: Url,
}

impl ReqwestBackendApi {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl BackendApi for ReqwestBackendApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, BackendApiError> {
        let url = build_url(&self.base_url, &request.path, &request.query)?;
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(ACCEPT, "application/json");
        if let Some(cookies) = request.cookie_header.as_deref() {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(trace_id) = TraceId::current() {
            builder = builder.header(TRACE_ID_HEADER, trace_id.to_string());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let body = decode_body(&bytes);
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            status,
            "backend request completed"
        );
        Ok(ApiResponse {
            status,
            body,
            set_cookies,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Append `path` to the base URL's own path and attach the query.
fn build_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url, BackendApiError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|error| BackendApiError::invalid_request(format!("{joined}: {error}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn multipart_form(parts: Vec<MultipartPart>) -> Result<Form, BackendApiError> {
    parts.into_iter().try_fold(Form::new(), |form, part| {
        let MultipartPart { name, value } = part;
        match value {
            PartValue::Text(text) => Ok(form.text(name, text)),
            PartValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let mut file = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = content_type {
                    file = file.mime_str(&mime).map_err(|error| {
                        BackendApiError::invalid_request(format!("content type {mime}: {error}"))
                    })?;
                }
                Ok(form.part(name, file))
            }
        }
    })
}

/// Decode a response body, treating empty or non-JSON bodies as `null`.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|error| {
        debug!(%error, "backend body is not JSON");
        Value::Null
    })
}

fn map_transport_error(error: reqwest::Error) -> BackendApiError {
    if error.is_timeout() {
        BackendApiError::timeout(error.to_string())
    } else if error.is_builder() {
        BackendApiError::invalid_request(error.to_string())
    } else {
        BackendApiError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network client helpers.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("https://api.example.test", "/public/auth/me", "https://api.example.test/public/auth/me")]
    #[case("https://api.example.test/", "public/auth/me", "https://api.example.test/public/auth/me")]
    #[case(
        "https://api.example.test/v2/",
        "/organization/homeopathy/org-1/patients/",
        "https://api.example.test/v2/organization/homeopathy/org-1/patients/"
    )]
    fn joins_paths_onto_base(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("base url");
        let url = build_url(&base, path, &[]).expect("url");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn appends_query_pairs() {
        let base = Url::parse("https://api.example.test").expect("base url");
        let url = build_url(
            &base,
            "/organization/homeopathy/org-1/patients/",
            &[
                ("search".to_owned(), "rahim khan".to_owned()),
                ("page".to_owned(), "2".to_owned()),
            ],
        )
        .expect("url");
        assert_eq!(url.query(), Some("search=rahim+khan&page=2"));
    }

    #[rstest]
    #[case(b"".as_slice(), Value::Null)]
    #[case(b"  \n".as_slice(), Value::Null)]
    #[case(b"<html>oops</html>".as_slice(), Value::Null)]
    #[case(br#"{"detail":"Not found."}"#.as_slice(), json!({"detail": "Not found."}))]
    fn decodes_bodies_leniently(#[case] bytes: &[u8], #[case] expected: Value) {
        assert_eq!(decode_body(bytes), expected);
    }

    #[test]
    fn rejects_invalid_mime_types() {
        let parts = vec![MultipartPart {
            name: "image".to_owned(),
            value: PartValue::File {
                file_name: "a.png".to_owned(),
                content_type: Some("not a mime".to_owned()),
                bytes: vec![0],
            },
        }];
        let error = multipart_form(parts).expect_err("invalid mime");
        assert!(matches!(error, BackendApiError::InvalidRequest { .. }));
    }

    #[test]
    fn maps_every_verb() {
        assert_eq!(to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }
}
