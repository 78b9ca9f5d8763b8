//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod backend_api;
mod identity_service;

#[cfg(test)]
pub use backend_api::MockBackendApi;
pub use backend_api::{
    ApiRequest, ApiResponse, BackendApi, BackendApiError, FORM_LEVEL_KEYS, HttpMethod,
    MultipartPart, PartValue, RequestBody,
};
#[cfg(test)]
pub use identity_service::MockIdentityService;
pub use identity_service::{
    FIXTURE_PASSWORD, FIXTURE_PHONE, FixtureIdentityService, IdentityService,
    IdentityServiceError, LoginOutcome, PhoneFlowOutcome, TokenPair,
};
