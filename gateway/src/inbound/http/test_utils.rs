//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::cookies::CookiePolicy;
use crate::domain::ports::{MockBackendApi, MockIdentityService};
use crate::domain::resources::Organization;
use crate::domain::{Identity, Role, UserProfile};
use crate::inbound::http::state::HttpState;

/// Owner of organisation `org-1`.
pub fn fixture_identity() -> Identity {
    Identity {
        user: UserProfile {
            id: "7".to_owned(),
            phone: "01712345678".to_owned(),
            name: "Dr. Ayesha Rahman".to_owned(),
            is_admin: false,
            role: Role::Owner,
        },
        organization: Some(Organization {
            id: "1".to_owned(),
            uid: "org-1".to_owned(),
            name: "Care".to_owned(),
            owner: Some("7".to_owned()),
            organization_type: Some("homeopathy".to_owned()),
            phone: None,
            address: None,
            is_active: true,
        }),
    }
}

/// Handler state over mocked ports with the development cookie policy.
pub fn state_with(identity: MockIdentityService, backend: MockBackendApi) -> HttpState {
    HttpState::new(Arc::new(identity), Arc::new(backend), CookiePolicy::default())
}

/// Handler state for tests that never reach the raw backend.
pub fn test_state(identity: MockIdentityService) -> HttpState {
    let mut backend = MockBackendApi::new();
    backend.expect_send().never();
    state_with(identity, backend)
}
