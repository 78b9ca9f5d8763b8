//! Submission pipeline: validate, transform, send, interpret.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{FormConfig, FormErrors, FormValues};
use crate::domain::GENERIC_FAILURE_MESSAGE;
use crate::domain::ports::{
    ApiRequest, ApiResponse, BackendApi, MultipartPart, PartValue, RequestBody,
};

/// File attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name of the `File` field the upload belongs to.
    pub field: String,
    /// Original file name sent as the multipart filename.
    pub file_name: String,
    /// MIME type, when the client supplied one.
    pub content_type: Option<String>,
    /// Decoded file contents.
    pub bytes: Vec<u8>,
}

/// Where to send the client after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Client route, already scoped to the organisation.
    pub path: String,
    /// Delay before navigating, so the success message stays visible.
    pub after: Duration,
}

/// Result of [`FormConfig::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Backend answered with the expected status.
    Succeeded {
        message: String,
        redirect: Option<Redirect>,
        /// Whether the client should restore default values.
        reset: bool,
        /// Record returned by the backend.
        record: Value,
    },
    /// Validation failed locally or the backend rejected the values.
    Rejected(FormErrors),
}

fn part_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

impl FormConfig {
    /// Initial values for every field.
    pub fn default_values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.kind.default_value()))
            .collect()
    }

    /// Evaluate the schema; empty errors mean the values may be sent.
    pub fn validate(&self, values: &FormValues) -> FormErrors {
        self.schema.validate(values)
    }

    /// Encode values and files as the request body.
    ///
    /// Forms with any `File` field go out as multipart: each non-null value
    /// becomes a text part and each upload targeting a `File` field a file
    /// part. Other forms are sent as a JSON object.
    pub fn build_body(&self, values: FormValues, files: Vec<UploadedFile>) -> RequestBody {
        if !self.has_file_fields() {
            return RequestBody::Json(Value::Object(values));
        }

        let is_file_field = |name: &str| {
            self.field_named(name)
                .is_some_and(|field| field.kind.is_file())
        };
        let mut parts: Vec<MultipartPart> = values
            .iter()
            .filter(|(name, _)| !is_file_field(name))
            .filter_map(|(name, value)| part_text(value).map(|text| MultipartPart::text(name, text)))
            .collect();
        parts.extend(
            files
                .into_iter()
                .filter(|file| is_file_field(&file.field))
                .map(|file| MultipartPart {
                    name: file.field,
                    value: PartValue::File {
                        file_name: file.file_name,
                        content_type: file.content_type,
                        bytes: file.bytes,
                    },
                }),
        );
        RequestBody::Multipart(parts)
    }

    /// Validate, transform and send the values, then interpret the answer.
    ///
    /// Validation failures never reach the network. The expected status
    /// yields [`SubmitOutcome::Succeeded`]; any other status maps the body
    /// onto field and form errors; transport failures become a single
    /// form-level message.
    pub async fn submit(
        &self,
        api: &dyn BackendApi,
        values: FormValues,
        files: Vec<UploadedFile>,
        cookie_header: Option<&str>,
    ) -> SubmitOutcome {
        let errors = self.validate(&values);
        if !errors.is_empty() {
            debug!(form = %self.name, fields = errors.fields.len(), "form failed validation");
            return SubmitOutcome::Rejected(errors);
        }

        let values = match self.transform {
            Some(transform) => transform(values),
            None => values,
        };
        let request = ApiRequest::new(self.method.http_method(), self.endpoint.as_str())
            .with_body(self.build_body(values, files))
            .with_cookies(cookie_header);

        match api.send(request).await {
            Ok(response) if response.status == self.method.expected_status() => {
                SubmitOutcome::Succeeded {
                    message: self.success_message.clone(),
                    redirect: self.redirect_path.as_ref().map(|path| Redirect {
                        path: path.clone(),
                        after: self.redirect_delay,
                    }),
                    reset: self.reset_on_success,
                    record: response.payload().clone(),
                }
            }
            Ok(response) => SubmitOutcome::Rejected(rejection_errors(&response)),
            Err(error) => {
                warn!(form = %self.name, %error, "form submission transport failure");
                let mut errors = FormErrors::default();
                errors.add_form(GENERIC_FAILURE_MESSAGE);
                SubmitOutcome::Rejected(errors)
            }
        }
    }
}

fn rejection_errors(response: &ApiResponse) -> FormErrors {
    let mut errors = FormErrors::from(response.validation_errors());
    if errors.is_empty() {
        errors.add_form(
            response
                .general_message()
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned()),
        );
    }
    errors
}
