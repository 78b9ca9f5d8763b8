//! Validation schemas evaluated before a form is submitted.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{FormErrors, FormValues};
use crate::domain::formatting::is_valid_phone;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// A single constraint on one field.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Value must be present and non-blank.
    Required,
    /// Text must have at least this many characters.
    MinLength(usize),
    /// Text must have at most this many characters.
    MaxLength(usize),
    /// Text must match the expression.
    Pattern {
        regex: &'static Regex,
        message: &'static str,
    },
    /// Text must look like an email address.
    Email,
    /// Text must be a valid mobile number.
    Phone,
    /// Number must fall within the bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Value must be one of the listed choices.
    OneOf(Vec<String>),
}

/// Whether a raw value counts as "not provided".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl Rule {
    /// Evaluate against a present, non-blank value.
    fn check(&self, value: &Value) -> Option<String> {
        match self {
            Self::Required => None,
            Self::MinLength(min) => as_text(value)
                .filter(|text| text.chars().count() < *min)
                .map(|_| format!("Must be at least {min} characters.")),
            Self::MaxLength(max) => as_text(value)
                .filter(|text| text.chars().count() > *max)
                .map(|_| format!("Must be at most {max} characters.")),
            Self::Pattern { regex, message } => as_text(value)
                .filter(|text| !regex.is_match(text))
                .map(|_| (*message).to_owned()),
            Self::Email => as_text(value)
                .filter(|text| !email_regex().is_match(text.trim()))
                .map(|_| "Enter a valid email address.".to_owned()),
            Self::Phone => as_text(value)
                .filter(|text| !is_valid_phone(text))
                .map(|_| "Invalid phone number.".to_owned()),
            Self::Range { min, max } => match as_number(value) {
                None => Some("Enter a valid number.".to_owned()),
                Some(number) if min.is_some_and(|min| number < min) => {
                    min.map(|min| format!("Must be at least {min}."))
                }
                Some(number) if max.is_some_and(|max| number > max) => {
                    max.map(|max| format!("Must be at most {max}."))
                }
                Some(_) => None,
            },
            Self::OneOf(choices) => as_text(value)
                .filter(|text| !choices.iter().any(|choice| choice == text))
                .map(|_| "Select a valid choice.".to_owned()),
        }
    }
}

/// Rules per field, evaluated in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    rules: Vec<(String, Vec<Rule>)>,
}

impl FormSchema {
    /// Empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach rules to `field`.
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::forms::{FormSchema, Rule};
    /// use serde_json::{json, Map};
    ///
    /// let schema = FormSchema::new().field("name", [Rule::Required]);
    /// let errors = schema.validate(&Map::new());
    /// assert_eq!(errors.field("name"), ["This field is required.".to_owned()]);
    /// ```
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.push((name.into(), rules.into_iter().collect()));
        self
    }

    /// Evaluate every rule and collect failures.
    ///
    /// Blank values only fail `Required`; other rules apply to values that
    /// were provided. Only the first failing rule per field is reported.
    pub fn validate(&self, values: &FormValues) -> FormErrors {
        let mut errors = FormErrors::default();
        for (field, rules) in &self.rules {
            let value = values.get(field);
            if is_blank(value) {
                if rules.iter().any(|rule| matches!(rule, Rule::Required)) {
                    errors.add_field(field.as_str(), "This field is required.");
                }
                continue;
            }
            let Some(value) = value else { continue };
            if let Some(message) = rules.iter().find_map(|rule| rule.check(value)) {
                errors.add_field(field.as_str(), message);
            }
        }
        errors
    }
}
