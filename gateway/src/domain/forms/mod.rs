//! Declarative form engine.
//!
//! A [`FormConfig`] describes the fields a client renders, the schema the
//! values must satisfy, and where the validated values are sent. The engine
//! derives default values per field kind, validates before any network call,
//! builds a JSON or multipart body, and maps the backend's answer back onto
//! fields.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use super::ports::HttpMethod;

pub mod catalogue;
mod engine;
pub mod schema;

pub use engine::{Redirect, SubmitOutcome, UploadedFile};
pub use schema::{FormSchema, Rule};

/// Raw values keyed by field name.
pub type FormValues = Map<String, Value>;

/// Field-level error shared by the form engine, login validation and the
/// API client's error-body conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Field name, or `non_field_errors` for form-level messages.
    pub field: String,
    /// Messages in the order received.
    pub messages: Vec<String>,
}

impl ValidationError {
    /// Build an error for `field` with one or more messages.
    pub fn new(
        field: impl Into<String>,
        messages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            field: field.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Choice offered by select and radio fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Submitted value.
    pub value: String,
    /// Text shown to the user.
    pub label: String,
}

impl SelectOption {
    /// Option whose label differs from its value.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Field kinds; each variant carries only the attributes it uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Email address.
    Email,
    /// Masked password.
    Password,
    /// Bangladeshi mobile number.
    Phone,
    /// Number with optional bounds.
    Number { min: Option<f64>, max: Option<f64> },
    /// Multi-line text.
    TextArea { rows: u8 },
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Drop-down choice.
    Select { options: Vec<SelectOption> },
    /// Radio-button choice.
    Radio { options: Vec<SelectOption> },
    /// Boolean toggle.
    Checkbox,
    /// File upload, optionally restricted by `accept`.
    File { accept: Option<String> },
}

impl FieldKind {
    /// Value a freshly rendered form starts with.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Checkbox => Value::Bool(false),
            Self::Number { .. } | Self::File { .. } => Value::Null,
            Self::Text
            | Self::Email
            | Self::Password
            | Self::Phone
            | Self::TextArea { .. }
            | Self::Date
            | Self::Time
            | Self::Select { .. }
            | Self::Radio { .. } => Value::String(String::new()),
        }
    }

    /// Whether values of this kind travel as uploaded files.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// One rendered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Key in the submitted values.
    pub name: String,
    /// Text shown beside the input.
    pub label: String,
    /// Input kind and its kind-specific settings.
    pub kind: FieldKind,
    /// Whether the client marks the field as required.
    pub required: bool,
    /// Hint shown in an empty input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldConfig {
    /// Optional field without a placeholder.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
        }
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Verbs a form may submit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    /// Create; expects `201`.
    Post,
    /// Replace; expects `200`.
    Put,
    /// Partial update; expects `200`.
    Patch,
}

impl FormMethod {
    /// Status the backend answers with on success.
    pub fn expected_status(self) -> u16 {
        match self {
            Self::Post => 201,
            Self::Put | Self::Patch => 200,
        }
    }

    /// Verb used on the wire.
    pub fn http_method(self) -> HttpMethod {
        match self {
            Self::Post => HttpMethod::Post,
            Self::Put => HttpMethod::Put,
            Self::Patch => HttpMethod::Patch,
        }
    }
}

/// Hook rewriting validated values before they are sent.
pub type Transform = fn(FormValues) -> FormValues;

/// Default pause before following a success redirect.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Complete description of one form.
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Form identifier used in routes and logs.
    pub name: String,
    /// Fields in display order.
    pub fields: Vec<FieldConfig>,
    /// Validation applied before any network call.
    pub schema: FormSchema,
    /// Backend path, relative to the API base URL.
    pub endpoint: String,
    /// HTTP method, which also fixes the expected success status.
    pub method: FormMethod,
    /// Reshapes validated values before they are sent.
    pub transform: Option<Transform>,
    /// Client route to visit after success.
    pub redirect_path: Option<String>,
    /// Message shown after success.
    pub success_message: String,
    /// Pause before the redirect.
    pub redirect_delay: Duration,
    /// Whether the client restores default values after success.
    pub reset_on_success: bool,
}

impl FormConfig {
    /// `POST` form with no redirect and the stock success message.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            schema: FormSchema::default(),
            endpoint: endpoint.into(),
            method: FormMethod::Post,
            transform: None,
            redirect_path: None,
            success_message: "Saved successfully.".to_owned(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            reset_on_success: false,
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    /// Replace the schema.
    #[must_use]
    pub fn schema(mut self, schema: FormSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Change the verb.
    #[must_use]
    pub fn method(mut self, method: FormMethod) -> Self {
        self.method = method;
        self
    }

    /// Rewrite values before sending.
    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Redirect after success.
    #[must_use]
    pub fn redirect(mut self, path: impl Into<String>, delay: Duration) -> Self {
        self.redirect_path = Some(path.into());
        self.redirect_delay = delay;
        self
    }

    /// Message shown after success.
    #[must_use]
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Clear the form after success.
    #[must_use]
    pub fn reset_on_success(mut self) -> Self {
        self.reset_on_success = true;
        self
    }

    /// Look up a field by name.
    pub fn field_named(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether any field uploads a file.
    pub fn has_file_fields(&self) -> bool {
        self.fields.iter().any(|field| field.kind.is_file())
    }
}

/// Errors attached to a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormErrors {
    /// Messages keyed by field name.
    pub fields: BTreeMap<String, Vec<String>>,
    /// Messages for the form as a whole.
    pub form: Vec<String>,
}

impl FormErrors {
    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty()
    }

    /// Record a message against `field`.
    pub fn add_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Record a form-level message.
    pub fn add_form(&mut self, message: impl Into<String>) {
        self.form.push(message.into());
    }

    /// Messages recorded for `field`.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Flatten to the shared error shape; form-level messages use
    /// `non_field_errors`.
    pub fn to_validation_errors(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .fields
            .iter()
            .map(|(field, messages)| ValidationError::new(field.as_str(), messages.iter().cloned()))
            .collect();
        if !self.form.is_empty() {
            errors.push(ValidationError::new(
                "non_field_errors",
                self.form.iter().cloned(),
            ));
        }
        errors
    }
}

impl From<Vec<ValidationError>> for FormErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        let mut out = Self::default();
        for error in errors {
            let form_level =
                super::ports::FORM_LEVEL_KEYS.contains(&error.field.as_str());
            for message in error.messages {
                if message.trim().is_empty() {
                    continue;
                }
                if form_level {
                    out.add_form(message);
                } else {
                    out.add_field(error.field.clone(), message);
                }
            }
        }
        out
    }
}
