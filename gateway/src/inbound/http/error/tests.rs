//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("boom")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn field_error_case(expected_trace_id: String) -> Error {
    Error::invalid_request("bad")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"fieldErrors": {"phone": ["Invalid phone number."]}}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn error_responses_include_trace_id_and_payloads(
    #[from(internal_error_case)] internal_error: Error,
    #[from(field_error_case)] field_error: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), REDACTED_MESSAGE);
    assert!(redacted.details().is_none());

    let payload = assert_error_response(
        field_error,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        payload.details(),
        Some(&json!({"fieldErrors": {"phone": ["Invalid phone number."]}}))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::not_found("missing");
    let payload = assert_error_response(error, StatusCode::NOT_FOUND, None).await;
    assert_eq!(payload.trace_id(), None);
}

#[given("a service unavailable error code")]
fn a_service_unavailable_error_code() -> ErrorCode {
    ErrorCode::ServiceUnavailable
}

#[when("the adapter maps the code to an HTTP status")]
fn the_adapter_maps_the_code_to_http_status(code: ErrorCode) -> StatusCode {
    super::status_for(code)
}

#[then("the status is 503 Service Unavailable")]
fn the_status_is_503(status: StatusCode) {
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
fn unavailable_backend_maps_to_503() {
    let code = a_service_unavailable_error_code();
    let status = the_adapter_maps_the_code_to_http_status(code);
    the_status_is_503(status);
}

#[rstest]
fn backend_transport_errors_use_generic_message() {
    let err: Error = BackendApiError::timeout("deadline elapsed").into();
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(err.message(), GENERIC_FAILURE_MESSAGE);
}

#[rstest]
#[case(IdentityServiceError::unavailable("refused"), ErrorCode::ServiceUnavailable)]
#[case(IdentityServiceError::decode("no tokens"), ErrorCode::InternalError)]
fn identity_errors_map_by_kind(#[case] source: IdentityServiceError, #[case] code: ErrorCode) {
    let err: Error = source.into();
    assert_eq!(err.code(), code);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    let actix_err = actix_web::error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), REDACTED_MESSAGE);
    assert_eq!(err.details(), None);
}

#[rstest]
#[case(401, json!({"detail": "Token expired"}), ErrorCode::Unauthorized, "Token expired")]
#[case(403, json!(null), ErrorCode::Forbidden, "access denied")]
#[case(404, json!({"detail": "Not found."}), ErrorCode::NotFound, "Not found.")]
#[case(502, json!(null), ErrorCode::ServiceUnavailable, GENERIC_FAILURE_MESSAGE)]
fn backend_statuses_are_mirrored(
    #[case] status: u16,
    #[case] body: serde_json::Value,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let err = backend_status_error(&ApiResponse::json(status, body));
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
}

#[rstest]
fn backend_field_errors_become_details() {
    let err = backend_status_error(&ApiResponse::json(
        400,
        json!({"phone": ["Invalid phone number."]}),
    ));
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details(),
        Some(&json!({"fieldErrors": {"phone": ["Invalid phone number."]}}))
    );
}

#[rstest]
#[case(400, json!({"detail": ""}), ErrorCode::InvalidRequest, "Invalid request.")]
#[case(400, json!({"non_field_errors": [""]}), ErrorCode::InvalidRequest, "Invalid request.")]
#[case(401, json!({"detail": "  "}), ErrorCode::Unauthorized, "login required")]
#[case(403, json!({"non_field_errors": ["", " "]}), ErrorCode::Forbidden, "access denied")]
#[case(404, json!({"detail": ""}), ErrorCode::NotFound, "Not found.")]
#[case(404, json!(""), ErrorCode::NotFound, "Not found.")]
#[case(500, json!({"message": ""}), ErrorCode::ServiceUnavailable, GENERIC_FAILURE_MESSAGE)]
#[case(503, json!({"error": [7]}), ErrorCode::ServiceUnavailable, GENERIC_FAILURE_MESSAGE)]
fn blank_backend_messages_fall_back_to_defaults(
    #[case] status: u16,
    #[case] body: serde_json::Value,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let err = backend_status_error(&ApiResponse::json(status, body));
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
}

#[rstest]
fn blank_field_messages_are_not_reported() {
    let err = backend_status_error(&ApiResponse::json(
        400,
        json!({"phone": [""], "name": "  "}),
    ));
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "Invalid request.");
    assert_eq!(err.details(), None);
}
