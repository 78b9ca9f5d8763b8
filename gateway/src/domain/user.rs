//! Authenticated identity as reported by the practice backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resources::Organization;

/// Role attached to a practice user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Owner of a single organisation.
    Owner,
    /// Practitioner attached to an organisation.
    Doctor,
    /// Front-desk or pharmacy staff.
    #[default]
    #[serde(other)]
    Staff,
}

/// Current user view shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier.
    #[serde(deserialize_with = "super::resources::id_as_string")]
    pub id: String,
    /// Login phone number.
    #[serde(default)]
    pub phone: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the user may enter the admin console.
    #[serde(default, alias = "is_admin")]
    pub is_admin: bool,
    /// Role within the practice.
    #[serde(default)]
    pub role: Role,
}

/// Authenticated identity: the user plus the organisation they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Authenticated user.
    pub user: UserProfile,
    /// Organisation, absent for platform administrators.
    pub organization: Option<Organization>,
}

impl Identity {
    /// Split a `/public/auth/me` body into user and organisation.
    ///
    /// The backend either nests the user under `user` or returns the user
    /// fields at the top level alongside an `organization` key.
    pub fn from_me_body(body: &Value) -> Result<Self, serde_json::Error> {
        let organization = match body.get("organization") {
            Some(Value::Null) | None => None,
            Some(org) => Some(serde_json::from_value(org.clone())?),
        };
        let user_value = match body.get("user") {
            Some(user) => user.clone(),
            None => {
                let mut top = body.clone();
                if let Some(map) = top.as_object_mut() {
                    map.remove("organization");
                }
                top
            }
        };
        let user = serde_json::from_value(user_value)?;
        Ok(Self { user, organization })
    }
}
