//! Route classification and role checks applied by the auth gate.
//!
//! Paths are compared segment by segment, so `//admin//users` classifies
//! exactly like `/admin/users` whether or not the router merged the slashes.

use std::borrow::Cow;

use super::tokens::Claims;
use super::user::Role;

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated but unauthorised requests are sent.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Exact paths reachable without a session.
const PUBLIC_PATHS: [&str; 7] = [
    LOGIN_PATH,
    "/register",
    UNAUTHORIZED_PATH,
    "/forgot-password",
    "/phone-verification",
    "/docs",
    "/metrics",
];

/// Path prefixes reachable without a session.
const PUBLIC_PREFIXES: [&str; 4] = ["/health/", "/api/v1/auth/", "/api-docs/", "/docs/"];

/// First segments that belong to the application rather than an organisation.
const APP_SEGMENTS: [&str; 8] = [
    "admin",
    "api",
    "dashboard",
    "profile",
    "settings",
    "onboarding",
    "static",
    "favicon.ico",
];

/// Leading segments of organisation-scoped API routes.
const API_ORGANIZATIONS: [&str; 3] = ["api", "v1", "organizations"];

/// Terminal states of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The request continues to its handler.
    Allowed,
    /// No valid session; send the client to [`LOGIN_PATH`].
    RedirectLogin,
    /// Logged in but not permitted; send the client to [`UNAUTHORIZED_PATH`].
    RedirectUnauthorized,
}

impl GateDecision {
    /// Redirect target, when the decision is a redirect.
    pub fn location(self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::RedirectLogin => Some(LOGIN_PATH),
            Self::RedirectUnauthorized => Some(UNAUTHORIZED_PATH),
        }
    }
}

/// Whether `path` bypasses the gate.
///
/// # Examples
/// ```
/// use gateway::domain::access::is_public_path;
///
/// assert!(is_public_path("/login"));
/// assert!(is_public_path("/api/v1/auth/login"));
/// assert!(!is_public_path("/org-1/patients"));
/// ```
pub fn is_public_path(path: &str) -> bool {
    let path = collapse_slashes(path);
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        other => other,
    };
    PUBLIC_PATHS.contains(&trimmed) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Whether `path` is `/admin` or below it.
pub fn is_admin_path(path: &str) -> bool {
    segments(path).next() == Some("admin")
}

/// Organisation identifier a path is scoped to, if any.
///
/// Both page routes (`/{organizationId}/...`) and API routes
/// (`/api/v1/organizations/{organizationId}/...`) are recognised.
pub fn organization_segment(path: &str) -> Option<&str> {
    let mut parts = segments(path);
    let first = parts.next()?;
    if first == API_ORGANIZATIONS[0] {
        let scoped = parts
            .by_ref()
            .take(2)
            .eq(API_ORGANIZATIONS[1..].iter().copied());
        return if scoped { parts.next() } else { None };
    }
    (!APP_SEGMENTS.contains(&first)).then_some(first)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn collapse_slashes(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }
    let mut collapsed = String::with_capacity(path.len());
    for segment in segments(path) {
        collapsed.push('/');
        collapsed.push_str(segment);
    }
    if collapsed.is_empty() || path.ends_with('/') {
        collapsed.push('/');
    }
    Cow::Owned(collapsed)
}

/// Role check for an authenticated request.
///
/// Admin routes need `is_admin`. Owners may only enter their own
/// organisation's routes.
pub fn authorize(path: &str, claims: &Claims) -> GateDecision {
    if is_admin_path(path) && !claims.is_admin {
        return GateDecision::RedirectUnauthorized;
    }
    if claims.role == Role::Owner && !claims.is_admin {
        if let Some(segment) = organization_segment(path) {
            if claims.organization_uid.as_deref() != Some(segment) {
                return GateDecision::RedirectUnauthorized;
            }
        }
    }
    GateDecision::Allowed
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn claims(role: Role, is_admin: bool, org: Option<&str>) -> Claims {
        Claims {
            user_id: "1".to_owned(),
            is_admin,
            organization_uid: org.map(str::to_owned),
            role,
            exp: u64::MAX,
        }
    }

    #[rstest]
    #[case("/login", true)]
    #[case("/login/", true)]
    #[case("/register", true)]
    #[case("/unauthorized", true)]
    #[case("/health/ready", true)]
    #[case("/api/v1/auth/me", true)]
    #[case("/api-docs/openapi.json", true)]
    #[case("/", false)]
    #[case("/loginx", false)]
    #[case("/admin", false)]
    #[case("/org-1/patients", false)]
    #[case("//login", true)]
    #[case("/api/v1//auth/me", true)]
    #[case("//", false)]
    #[case("//org-1//patients", false)]
    fn public_paths(#[case] path: &str, #[case] public: bool) {
        assert_eq!(is_public_path(path), public);
    }

    #[rstest]
    #[case("/org-1", Some("org-1"))]
    #[case("/org-1/patients/4", Some("org-1"))]
    #[case("/api/v1/organizations/org-2/patients", Some("org-2"))]
    #[case("/api/v1/organizations", None)]
    #[case("/dashboard", None)]
    #[case("/admin/users", None)]
    #[case("/", None)]
    #[case("//org-1//patients", Some("org-1"))]
    #[case("/api//v1/organizations//org-3/", Some("org-3"))]
    #[case("/api/v2/organizations/org-3", None)]
    #[case("//admin/users", None)]
    fn organisation_segments(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(organization_segment(path), expected);
    }

    #[rstest]
    #[case("/admin", false, GateDecision::RedirectUnauthorized)]
    #[case("/admin/organizations", false, GateDecision::RedirectUnauthorized)]
    #[case("/admin/organizations", true, GateDecision::Allowed)]
    #[case("/administrator", false, GateDecision::Allowed)]
    #[case("//admin/organizations", false, GateDecision::RedirectUnauthorized)]
    #[case("/admin//", false, GateDecision::RedirectUnauthorized)]
    #[case("///admin", true, GateDecision::Allowed)]
    fn admin_routes_need_admin(
        #[case] path: &str,
        #[case] is_admin: bool,
        #[case] expected: GateDecision,
    ) {
        let claims = claims(Role::Staff, is_admin, None);
        assert_eq!(authorize(path, &claims), expected);
    }

    #[rstest]
    #[case("/org-1/patients", GateDecision::Allowed)]
    #[case("/org-2/patients", GateDecision::RedirectUnauthorized)]
    #[case("/api/v1/organizations/org-2/medicines", GateDecision::RedirectUnauthorized)]
    #[case("/dashboard", GateDecision::Allowed)]
    #[case("//org-2//patients", GateDecision::RedirectUnauthorized)]
    #[case("/api//v1//organizations/org-2", GateDecision::RedirectUnauthorized)]
    fn owners_stay_in_their_organisation(#[case] path: &str, #[case] expected: GateDecision) {
        let claims = claims(Role::Owner, false, Some("org-1"));
        assert_eq!(authorize(path, &claims), expected);
    }

    #[test]
    fn doctors_are_not_scoped_by_the_gate() {
        let claims = claims(Role::Doctor, false, Some("org-1"));
        assert_eq!(authorize("/org-2/appointments", &claims), GateDecision::Allowed);
    }

    #[test]
    fn decisions_expose_locations() {
        assert_eq!(GateDecision::Allowed.location(), None);
        assert_eq!(GateDecision::RedirectLogin.location(), Some("/login"));
        assert_eq!(
            GateDecision::RedirectUnauthorized.location(),
            Some("/unauthorized")
        );
    }
}
