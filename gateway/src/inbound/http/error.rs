//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::ports::{ApiResponse, BackendApiError, IdentityServiceError};
use crate::domain::{Error, ErrorCode, GENERIC_FAILURE_MESSAGE, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal(REDACTED_MESSAGE);
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}

/// Backend outages surface as `503` with the message users see in forms.
impl From<BackendApiError> for Error {
    fn from(err: BackendApiError) -> Self {
        error!(error = %err, "practice backend request failed");
        Error::service_unavailable(GENERIC_FAILURE_MESSAGE)
    }
}

impl From<IdentityServiceError> for Error {
    fn from(err: IdentityServiceError) -> Self {
        match err {
            IdentityServiceError::Unavailable { .. } => {
                error!(error = %err, "identity backend unavailable");
                Error::service_unavailable(GENERIC_FAILURE_MESSAGE)
            }
            IdentityServiceError::Decode { .. } => {
                error!(error = %err, "identity backend answered unexpectedly");
                Error::internal(err.to_string())
            }
        }
    }
}

/// Map a non-success backend answer onto the gateway's error taxonomy.
///
/// The status class is mirrored and the backend's own message kept; field
/// errors on a `400` travel in `details.fieldErrors`.
pub(crate) fn backend_status_error(response: &ApiResponse) -> Error {
    let message = response.general_message();
    match response.status {
        400 => {
            let errors = response.validation_errors();
            let message = message.unwrap_or_else(|| "Invalid request.".to_owned());
            if errors.is_empty() {
                Error::invalid_request(message)
            } else {
                Error::field_errors(message, &errors)
            }
        }
        401 => Error::unauthorized(message.unwrap_or_else(|| "login required".to_owned())),
        403 => Error::forbidden(message.unwrap_or_else(|| "access denied".to_owned())),
        404 => Error::not_found(message.unwrap_or_else(|| "Not found.".to_owned())),
        status => {
            error!(status, "practice backend answered with an unexpected status");
            Error::service_unavailable(
                message.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned()),
            )
        }
    }
}

#[cfg(test)]
mod tests;
