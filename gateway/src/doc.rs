//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every gateway endpoint together with the external
//! schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`],
//! [`UserProfileSchema`], [`OrganizationSchema`]) and the access-token cookie
//! security scheme. Request and response bodies referenced by the paths are
//! collected automatically.
//!
//! The document backs Swagger UI in debug builds and is exported by
//! `cargo run --bin openapi-dump`.

use crate::inbound::http::schemas::{
    ErrorCodeSchema, ErrorSchema, OrganizationSchema, UserProfileSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the access-token cookie scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "AccessTokenCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "access_token",
                "HTTP-only access token cookie set by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the gateway.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Practice gateway API",
        description = "Authentication, practice resources and dynamic forms in front of the homeopathy practice backend."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("AccessTokenCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::auth::phone_verification,
        crate::inbound::http::auth::forgot_password,
        crate::inbound::http::resources::list_organizations,
        crate::inbound::http::resources::list_resources,
        crate::inbound::http::resources::get_resource,
        crate::inbound::http::forms::describe_form,
        crate::inbound::http::forms::create_record,
        crate::inbound::http::forms::update_record,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema, UserProfileSchema, OrganizationSchema)),
    tags(
        (name = "auth", description = "Login, logout and session identity"),
        (name = "resources", description = "Organisation-scoped practice records"),
        (name = "forms", description = "Catalogue form descriptors and submissions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema and path registration.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const PROFILE_SCHEMA_NAME: &str = "crate.domain.UserProfile";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn profile_schema_uses_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let profile = schemas.get(PROFILE_SCHEMA_NAME).expect("UserProfile schema");

        assert_object_schema_has_field(profile, "isAdmin");
    }

    #[rstest]
    #[case("/api/v1/auth/login")]
    #[case("/api/v1/auth/me")]
    #[case("/api/v1/organizations/{org}/{kind}")]
    #[case("/api/v1/forms/{form}")]
    #[case("/api/v1/forms/{form}/{id}")]
    #[case("/health/ready")]
    fn registers_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn declares_access_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("AccessTokenCookie"));
    }
}
