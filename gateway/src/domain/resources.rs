//! Client-side view shapes for practice resources.
//!
//! The backend owns these entities; the gateway only mirrors what it returns.
//! Fields are lenient (`default`, snake_case aliases) so additions on the
//! backend never break deserialisation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accept numeric or string identifiers and keep them as strings.
pub(crate) fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => Ok(raw),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

fn optional_id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(raw)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

/// Organisation-scoped collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Patient records.
    Patients,
    /// Homeopathic medicine inventory.
    Medicines,
    /// Appointment book.
    Appointments,
    /// Doctors attached to the organisation.
    Doctors,
}

impl ResourceKind {
    /// Path segment used by the backend.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Medicines => "medicines",
            Self::Appointments => "appointments",
            Self::Doctors => "doctors",
        }
    }

    /// Backend collection path for an organisation.
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::resources::ResourceKind;
    ///
    /// assert_eq!(
    ///     ResourceKind::Patients.collection_path("org-1"),
    ///     "/organization/homeopathy/org-1/patients/"
    /// );
    /// ```
    pub fn collection_path(self, organization_id: &str) -> String {
        format!(
            "/organization/homeopathy/{organization_id}/{}/",
            self.segment()
        )
    }

    /// Backend item path for an organisation.
    pub fn item_path(self, organization_id: &str, id: &str) -> String {
        format!("{}{id}/", self.collection_path(organization_id))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Error returned when parsing an unknown resource segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patients" => Ok(Self::Patients),
            "medicines" => Ok(Self::Medicines),
            "appointments" => Ok(Self::Appointments),
            "doctors" => Ok(Self::Doctors),
            other => Err(UnknownResourceKind(other.to_owned())),
        }
    }
}

/// Patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Backend primary key, stringified.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Full name.
    pub name: String,
    /// Mobile number as stored by the backend.
    #[serde(default)]
    pub phone: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Gender as entered.
    #[serde(default)]
    pub gender: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Occupation.
    #[serde(default)]
    pub occupation: Option<String>,
    /// ABO group with rhesus sign, e.g. `B+`.
    #[serde(default, alias = "blood_group")]
    pub blood_group: Option<String>,
    /// Free-text clinical notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Creation timestamp as the backend formats it.
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
}

/// Homeopathic medicine stock entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeopathicMedicine {
    /// Backend primary key, stringified.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Medicine name.
    pub name: String,
    /// Potency label, e.g. `30C`.
    #[serde(default)]
    pub potency: Option<String>,
    /// Dilution power.
    #[serde(default)]
    pub power: Option<String>,
    /// Manufacturer name.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Units in stock.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Price per unit.
    #[serde(default, alias = "unit_price")]
    pub unit_price: Option<f64>,
    /// Expiry date.
    #[serde(default, alias = "expiry_date")]
    pub expiry_date: Option<chrono::NaiveDate>,
    /// Manufacturer batch number.
    #[serde(default, alias = "batch_number")]
    pub batch_number: Option<String>,
}

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting confirmation.
    #[default]
    Pending,
    /// Confirmed by the practice.
    Confirmed,
    /// Visit took place.
    Completed,
    /// Called off by either side.
    Cancelled,
}

/// Appointment book entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Backend primary key, stringified.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Patient the appointment is for.
    #[serde(default, alias = "patient", deserialize_with = "optional_id_as_string")]
    pub patient_id: Option<String>,
    /// Patient name, when the backend embeds it.
    #[serde(default, alias = "patient_name")]
    pub patient_name: Option<String>,
    /// Appointment day.
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    /// Appointment time as entered.
    #[serde(default)]
    pub time: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Reason for the visit.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Organisation (tenant) summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Backend primary key, stringified.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Route identifier matched against the `organization_uid` token claim.
    #[serde(default)]
    pub uid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning user, as the backend names them.
    #[serde(default)]
    pub owner: Option<String>,
    /// Practice category, e.g. `homeopathy`.
    #[serde(default, alias = "type", alias = "organization_type")]
    pub organization_type: Option<String>,
    /// Contact number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Active flag; absent in the payload means active.
    #[serde(default = "default_active", alias = "is_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Practitioner attached to an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    /// Backend primary key, stringified.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Full name.
    pub name: String,
    /// Contact number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Clinical speciality.
    #[serde(default)]
    pub speciality: Option<String>,
    /// Professional registration number.
    #[serde(default, alias = "registration_number")]
    pub registration_number: Option<String>,
}

/// A page of results as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Total number of items across pages, when the backend reports it.
    pub count: usize,
    /// Items on this page.
    pub results: Vec<T>,
}
