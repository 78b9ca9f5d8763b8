//! Built-in forms for practice resources.
//!
//! Each form is parametrised by the organisation it belongs to and, for
//! edits, the record being updated.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use super::{
    FieldConfig, FieldKind, FormConfig, FormMethod, FormSchema, FormValues, Rule, SelectOption,
};
use crate::domain::formatting::normalize_phone_number;
use crate::domain::resources::ResourceKind;

static TIME_RE: OnceLock<Regex> = OnceLock::new();
static REGISTRATION_RE: OnceLock<Regex> = OnceLock::new();

fn time_regex() -> &'static Regex {
    TIME_RE.get_or_init(|| {
        Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$")
            .unwrap_or_else(|error| panic!("time regex failed to compile: {error}"))
    })
}

fn registration_regex() -> &'static Regex {
    REGISTRATION_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9/-]+$")
            .unwrap_or_else(|error| panic!("registration regex failed to compile: {error}"))
    })
}

/// Forms shipped with the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogueForm {
    /// New or edited patient record.
    Patient,
    /// Medicine stock entry, with an optional image.
    Medicine,
    /// Appointment booking.
    Appointment,
    /// Organisation onboarding.
    Organization,
    /// Practitioner record.
    Doctor,
}

impl CatalogueForm {
    /// Every catalogue entry.
    pub const ALL: [Self; 5] = [
        Self::Patient,
        Self::Medicine,
        Self::Appointment,
        Self::Organization,
        Self::Doctor,
    ];

    /// Stable form name used in URLs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Medicine => "medicine",
            Self::Appointment => "appointment",
            Self::Organization => "organization",
            Self::Doctor => "doctor",
        }
    }

    /// Whether the form is scoped to an organisation.
    pub fn is_org_scoped(self) -> bool {
        !matches!(self, Self::Organization)
    }

    fn resource(self) -> Option<ResourceKind> {
        match self {
            Self::Patient => Some(ResourceKind::Patients),
            Self::Medicine => Some(ResourceKind::Medicines),
            Self::Appointment => Some(ResourceKind::Appointments),
            Self::Doctor => Some(ResourceKind::Doctors),
            Self::Organization => None,
        }
    }

    /// Build the form for `organization_id`; `record_id` switches to an edit.
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::forms::FormMethod;
    /// use gateway::domain::forms::catalogue::CatalogueForm;
    ///
    /// let create = CatalogueForm::Patient.config("org-1", None);
    /// assert_eq!(create.endpoint, "/organization/homeopathy/org-1/patients/");
    /// assert_eq!(create.method, FormMethod::Post);
    ///
    /// let edit = CatalogueForm::Patient.config("org-1", Some("42"));
    /// assert_eq!(edit.endpoint, "/organization/homeopathy/org-1/patients/42/");
    /// assert_eq!(edit.method, FormMethod::Put);
    /// ```
    pub fn config(self, organization_id: &str, record_id: Option<&str>) -> FormConfig {
        let endpoint = match (self.resource(), record_id) {
            (Some(kind), Some(id)) => kind.item_path(organization_id, id),
            (Some(kind), None) => kind.collection_path(organization_id),
            (None, Some(id)) => format!("/organization/homeopathy/{id}/"),
            (None, None) => "/organization/homeopathy/".to_owned(),
        };
        let base = match self {
            Self::Patient => patient_form(endpoint, organization_id),
            Self::Medicine => medicine_form(endpoint, organization_id),
            Self::Appointment => appointment_form(endpoint, organization_id),
            Self::Organization => organization_form(endpoint),
            Self::Doctor => doctor_form(endpoint, organization_id),
        };
        match record_id {
            Some(_) => base
                .method(FormMethod::Put)
                .success_message(format!("{} updated successfully.", self.label())),
            None => base.reset_on_success(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Medicine => "Medicine",
            Self::Appointment => "Appointment",
            Self::Organization => "Organization",
            Self::Doctor => "Doctor",
        }
    }
}

impl fmt::Display for CatalogueForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a form name is not in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form: {0}")]
pub struct UnknownForm(pub String);

impl FromStr for CatalogueForm {
    type Err = UnknownForm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.name() == s)
            .ok_or_else(|| UnknownForm(s.to_owned()))
    }
}

fn options(values: &[(&str, &str)]) -> Vec<SelectOption> {
    values
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect()
}

fn option_values(values: &[(&str, &str)]) -> Vec<String> {
    values.iter().map(|(value, _)| (*value).to_owned()).collect()
}

const GENDERS: [(&str, &str); 3] = [("male", "Male"), ("female", "Female"), ("other", "Other")];
const BLOOD_GROUPS: [(&str, &str); 8] = [
    ("A+", "A+"),
    ("A-", "A-"),
    ("B+", "B+"),
    ("B-", "B-"),
    ("AB+", "AB+"),
    ("AB-", "AB-"),
    ("O+", "O+"),
    ("O-", "O-"),
];
const POTENCIES: [(&str, &str); 6] = [
    ("Q", "Mother tincture (Q)"),
    ("6C", "6C"),
    ("30C", "30C"),
    ("200C", "200C"),
    ("1M", "1M"),
    ("10M", "10M"),
];
const APPOINTMENT_STATUSES: [(&str, &str); 4] = [
    ("pending", "Pending"),
    ("confirmed", "Confirmed"),
    ("completed", "Completed"),
    ("cancelled", "Cancelled"),
];
const ORGANIZATION_TYPES: [(&str, &str); 2] = [("homeopathy", "Homeopathy"), ("clinic", "Clinic")];

/// Rewrite the `phone` value into canonical form; invalid values were already
/// rejected by the schema.
fn normalize_phone_field(mut values: FormValues) -> FormValues {
    let canonical = values
        .get("phone")
        .and_then(Value::as_str)
        .and_then(normalize_phone_number);
    if let Some(phone) = canonical {
        values.insert("phone".to_owned(), Value::String(phone));
    }
    values
}

fn patient_form(endpoint: String, organization_id: &str) -> FormConfig {
    FormConfig::new("patient", endpoint)
        .field(
            FieldConfig::new("name", "Full name", FieldKind::Text)
                .required()
                .placeholder("Patient name"),
        )
        .field(
            FieldConfig::new("phone", "Phone", FieldKind::Phone)
                .required()
                .placeholder("01XXXXXXXXX"),
        )
        .field(FieldConfig::new(
            "age",
            "Age",
            FieldKind::Number {
                min: Some(0.0),
                max: Some(150.0),
            },
        ))
        .field(FieldConfig::new(
            "gender",
            "Gender",
            FieldKind::Radio {
                options: options(&GENDERS),
            },
        ))
        .field(FieldConfig::new(
            "blood_group",
            "Blood group",
            FieldKind::Select {
                options: options(&BLOOD_GROUPS),
            },
        ))
        .field(FieldConfig::new("occupation", "Occupation", FieldKind::Text))
        .field(FieldConfig::new("address", "Address", FieldKind::TextArea { rows: 3 }))
        .field(FieldConfig::new("notes", "Notes", FieldKind::TextArea { rows: 4 }))
        .schema(
            FormSchema::new()
                .field("name", [Rule::Required, Rule::MinLength(2), Rule::MaxLength(100)])
                .field("phone", [Rule::Required, Rule::Phone])
                .field(
                    "age",
                    [Rule::Range {
                        min: Some(0.0),
                        max: Some(150.0),
                    }],
                )
                .field("gender", [Rule::OneOf(option_values(&GENDERS))])
                .field("blood_group", [Rule::OneOf(option_values(&BLOOD_GROUPS))])
                .field("address", [Rule::MaxLength(255)]),
        )
        .transform(normalize_phone_field)
        .success_message("Patient saved successfully.")
        .redirect(format!("/{organization_id}/patients"), Duration::from_millis(1500))
}

fn medicine_form(endpoint: String, organization_id: &str) -> FormConfig {
    FormConfig::new("medicine", endpoint)
        .field(FieldConfig::new("name", "Medicine name", FieldKind::Text).required())
        .field(
            FieldConfig::new(
                "potency",
                "Potency",
                FieldKind::Select {
                    options: options(&POTENCIES),
                },
            )
            .required(),
        )
        .field(FieldConfig::new("power", "Power", FieldKind::Text))
        .field(FieldConfig::new("manufacturer", "Manufacturer", FieldKind::Text))
        .field(
            FieldConfig::new(
                "quantity",
                "Quantity",
                FieldKind::Number {
                    min: Some(0.0),
                    max: None,
                },
            )
            .required(),
        )
        .field(FieldConfig::new(
            "unit_price",
            "Unit price",
            FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        ))
        .field(FieldConfig::new("expiry_date", "Expiry date", FieldKind::Date))
        .field(FieldConfig::new("batch_number", "Batch number", FieldKind::Text))
        .field(FieldConfig::new(
            "image",
            "Label photo",
            FieldKind::File {
                accept: Some("image/*".to_owned()),
            },
        ))
        .schema(
            FormSchema::new()
                .field("name", [Rule::Required, Rule::MaxLength(100)])
                .field("potency", [Rule::Required, Rule::OneOf(option_values(&POTENCIES))])
                .field(
                    "quantity",
                    [
                        Rule::Required,
                        Rule::Range {
                            min: Some(0.0),
                            max: None,
                        },
                    ],
                )
                .field(
                    "unit_price",
                    [Rule::Range {
                        min: Some(0.0),
                        max: None,
                    }],
                )
                .field("batch_number", [Rule::MaxLength(50)]),
        )
        .success_message("Medicine saved successfully.")
        .redirect(format!("/{organization_id}/medicines"), Duration::from_millis(1500))
}

fn appointment_form(endpoint: String, organization_id: &str) -> FormConfig {
    FormConfig::new("appointment", endpoint)
        .field(FieldConfig::new("patient", "Patient", FieldKind::Text).required())
        .field(FieldConfig::new("date", "Date", FieldKind::Date).required())
        .field(
            FieldConfig::new("time", "Time", FieldKind::Time)
                .required()
                .placeholder("HH:MM"),
        )
        .field(FieldConfig::new(
            "status",
            "Status",
            FieldKind::Select {
                options: options(&APPOINTMENT_STATUSES),
            },
        ))
        .field(FieldConfig::new("reason", "Reason", FieldKind::TextArea { rows: 3 }))
        .schema(
            FormSchema::new()
                .field("patient", [Rule::Required])
                .field("date", [Rule::Required])
                .field(
                    "time",
                    [
                        Rule::Required,
                        Rule::Pattern {
                            regex: time_regex(),
                            message: "Enter a time as HH:MM.",
                        },
                    ],
                )
                .field("status", [Rule::OneOf(option_values(&APPOINTMENT_STATUSES))])
                .field("reason", [Rule::MaxLength(500)]),
        )
        .success_message("Appointment saved successfully.")
        .redirect(
            format!("/{organization_id}/appointments"),
            Duration::from_millis(1500),
        )
}

fn organization_form(endpoint: String) -> FormConfig {
    FormConfig::new("organization", endpoint)
        .field(FieldConfig::new("name", "Organisation name", FieldKind::Text).required())
        .field(FieldConfig::new("phone", "Phone", FieldKind::Phone).required())
        .field(FieldConfig::new("email", "Email", FieldKind::Email))
        .field(
            FieldConfig::new(
                "organization_type",
                "Type",
                FieldKind::Radio {
                    options: options(&ORGANIZATION_TYPES),
                },
            )
            .required(),
        )
        .field(FieldConfig::new("address", "Address", FieldKind::TextArea { rows: 3 }))
        .field(FieldConfig::new("terms", "I accept the terms", FieldKind::Checkbox))
        .schema(
            FormSchema::new()
                .field("name", [Rule::Required, Rule::MinLength(2), Rule::MaxLength(120)])
                .field("phone", [Rule::Required, Rule::Phone])
                .field("email", [Rule::Email])
                .field(
                    "organization_type",
                    [Rule::Required, Rule::OneOf(option_values(&ORGANIZATION_TYPES))],
                ),
        )
        .transform(normalize_phone_field)
        .success_message("Organisation created successfully.")
        .redirect("/", Duration::from_secs(2))
}

fn doctor_form(endpoint: String, organization_id: &str) -> FormConfig {
    FormConfig::new("doctor", endpoint)
        .field(FieldConfig::new("name", "Name", FieldKind::Text).required())
        .field(FieldConfig::new("phone", "Phone", FieldKind::Phone).required())
        .field(FieldConfig::new("speciality", "Speciality", FieldKind::Text))
        .field(FieldConfig::new(
            "registration_number",
            "Registration number",
            FieldKind::Text,
        ))
        .schema(
            FormSchema::new()
                .field("name", [Rule::Required, Rule::MaxLength(100)])
                .field("phone", [Rule::Required, Rule::Phone])
                .field(
                    "registration_number",
                    [Rule::Pattern {
                        regex: registration_regex(),
                        message: "Use letters, digits, '/' or '-' only.",
                    }],
                ),
        )
        .transform(normalize_phone_field)
        .success_message("Doctor saved successfully.")
        .redirect(format!("/{organization_id}/doctors"), Duration::from_millis(1500))
}
