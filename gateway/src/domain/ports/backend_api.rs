//! Driven port for the external practice backend REST API.
//!
//! Every outbound call in the gateway goes through [`BackendApi::send`]: one
//! parameterised request returning the status code and decoded body. The
//! response type owns the backend's envelope and error-body conventions so
//! call sites never inspect raw JSON shapes themselves.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::forms::ValidationError;

/// HTTP verbs used against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Value of one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    /// Plain text field.
    Text(String),
    /// Uploaded file.
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Named multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Multipart field name.
    pub name: String,
    /// Text or file content.
    pub value: PartValue,
}

impl MultipartPart {
    /// Text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }
}

/// Request body variants; the adapter picks the matching content type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// URL-encoded form pairs.
    Form(Vec<(String, String)>),
    /// `multipart/form-data` parts.
    Multipart(Vec<MultipartPart>),
}

/// One request against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path relative to the configured base URL, e.g. `/public/auth/me`.
    pub path: String,
    /// Query pairs appended to the URL.
    pub query: Vec<(String, String)>,
    /// Request payload.
    pub body: RequestBody,
    /// Raw `Cookie` header forwarded from the browser.
    pub cookie_header: Option<String>,
}

impl ApiRequest {
    /// Start a request with an empty body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            cookie_header: None,
        }
    }

    /// `GET` shortcut.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` shortcut.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Forward the caller's cookies.
    #[must_use]
    pub fn with_cookies(mut self, cookie_header: Option<&str>) -> Self {
        self.cookie_header = cookie_header.map(str::to_owned);
        self
    }
}

/// Backend response: the `[status, body]` pair plus any cookies it issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body, `Value::Null` when empty or not JSON.
    pub body: Value,
    /// Raw `Set-Cookie` header values.
    pub set_cookies: Vec<String>,
}

/// Body keys that carry messages for the whole form rather than one field.
pub const FORM_LEVEL_KEYS: [&str; 4] = ["non_field_errors", "detail", "message", "error"];

impl ApiResponse {
    /// Response with a JSON body and no cookies.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            set_cookies: Vec::new(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The resource payload, unwrapped from a `results` or `data` envelope.
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::ports::ApiResponse;
    /// use serde_json::json;
    ///
    /// let res = ApiResponse::json(200, json!({"count": 1, "results": [{"id": 1}]}));
    /// assert_eq!(res.payload(), &json!([{"id": 1}]));
    /// ```
    pub fn payload(&self) -> &Value {
        self.body
            .get("results")
            .or_else(|| self.body.get("data"))
            .unwrap_or(&self.body)
    }

    /// Total item count for paginated responses, falling back to the payload length.
    pub fn count(&self) -> usize {
        self.body
            .get("count")
            .and_then(Value::as_u64)
            .and_then(|count| usize::try_from(count).ok())
            .or_else(|| self.payload().as_array().map(Vec::len))
            .unwrap_or(0)
    }

    /// Field-level errors carried by an error body.
    ///
    /// Each key becomes one [`ValidationError`]; string and array values are
    /// both accepted and nested objects flatten to `parent.child`.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Value::Object(map) = &self.body {
            for (key, value) in map {
                collect_messages(key, value, &mut errors);
            }
        }
        errors
    }

    /// A single human-readable message, when the body carries one.
    ///
    /// Blank strings never count as a message.
    pub fn general_message(&self) -> Option<String> {
        match &self.body {
            Value::String(message) => non_blank(message),
            Value::Object(map) => FORM_LEVEL_KEYS.iter().find_map(|key| {
                match map.get(*key) {
                    Some(Value::String(message)) => non_blank(message),
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .find_map(non_blank),
                    _ => None,
                }
            }),
            _ => None,
        }
    }
}

fn non_blank(message: &str) -> Option<String> {
    (!message.trim().is_empty()).then(|| message.to_owned())
}

fn collect_messages(field: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                collect_messages(&format!("{field}.{key}"), inner, errors);
            }
        }
        Value::Array(items) => {
            let messages: Vec<String> = items.iter().filter_map(message_text).collect();
            if !messages.is_empty() {
                errors.push(ValidationError::new(field, messages));
            }
        }
        other => {
            if let Some(message) = message_text(other) {
                errors.push(ValidationError::new(field, [message]));
            }
        }
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => non_blank(message),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
        other => Some(other.to_string()),
    }
}

define_port_error! {
    /// Errors surfaced while calling the practice backend.
    pub enum BackendApiError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "backend transport failed: {message}",
        /// The backend did not answer within the configured timeout.
        Timeout { message: String } =>
            "backend timeout: {message}",
        /// The adapter could not build the request.
        InvalidRequest { message: String } =>
            "backend request invalid: {message}",
    }
}

/// Port for sending one request to the practice backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Perform the request and return the status and decoded body.
    ///
    /// Non-2xx statuses are *not* errors: callers inspect
    /// [`ApiResponse::status`] themselves. Errors are reserved for transport
    /// failures.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, BackendApiError>;
}
