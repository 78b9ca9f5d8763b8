//! Identifier case conversion and phone-number helpers.
//!
//! The practice backend speaks `snake_case` JSON while browser clients expect
//! `camelCase`; these helpers convert keys recursively and translate client
//! ordering expressions. Phone helpers accept Bangladeshi mobile numbers with
//! or without the `+880` country prefix. Only ASCII digits count.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^01[3-9][0-9]{8}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Convert `snake_case` or `kebab-case` identifiers to `camelCase`.
///
/// # Examples
/// ```
/// use gateway::domain::formatting::to_camel_case;
///
/// assert_eq!(to_camel_case("blood_group"), "bloodGroup");
/// assert_eq!(to_camel_case("is_admin"), "isAdmin");
/// ```
pub fn to_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for ch in input.chars() {
        if ch == '_' || ch == '-' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert `camelCase` or `PascalCase` identifiers to `snake_case`.
///
/// # Examples
/// ```
/// use gateway::domain::formatting::to_snake_case;
///
/// assert_eq!(to_snake_case("bloodGroup"), "blood_group");
/// assert_eq!(to_snake_case("OrganizationUid"), "organization_uid");
/// ```
pub fn to_snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (index, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '-' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Recursively rewrite every object key in `value` with `convert`.
pub fn convert_keys(value: Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (convert(&key), convert_keys(inner, convert)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

/// Translate a client ordering expression such as `-createdAt,name` into the
/// backend's `snake_case` form, keeping any `-` descending marker.
///
/// # Examples
/// ```
/// use gateway::domain::formatting::backend_ordering;
///
/// assert_eq!(backend_ordering("-createdAt,name"), "-created_at,name");
/// ```
pub fn backend_ordering(ordering: &str) -> String {
    ordering
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| match term.strip_prefix('-') {
            Some(field) => format!("-{}", to_snake_case(field)),
            None => to_snake_case(term),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Normalise a phone number to the canonical `01XXXXXXXXX` form.
///
/// Spaces, dashes and a `+880`/`880` country prefix are tolerated. Returns
/// `None` when the remaining digits are not a valid mobile number.
///
/// # Examples
/// ```
/// use gateway::domain::formatting::normalize_phone_number;
///
/// assert_eq!(normalize_phone_number("+880 1712-345678").as_deref(), Some("01712345678"));
/// assert_eq!(normalize_phone_number("12345"), None);
/// ```
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
        .collect();
    let local = digits
        .strip_prefix("+880")
        .or_else(|| digits.strip_prefix("880"))
        .map_or_else(|| digits.clone(), |rest| format!("0{rest}"));
    phone_regex().is_match(&local).then_some(local)
}

/// Whether `raw` is a valid mobile number once normalised.
pub fn is_valid_phone(raw: &str) -> bool {
    normalize_phone_number(raw).is_some()
}

/// Format a phone number for display as `01XXX-XXXXXX`.
///
/// Invalid inputs are returned unchanged so the caller can still show them.
pub fn format_phone_number(raw: &str) -> String {
    normalize_phone_number(raw)
        .and_then(|local| {
            let (head, tail) = (local.get(..5)?, local.get(5..)?);
            Some(format!("{head}-{tail}"))
        })
        .unwrap_or_else(|| raw.to_owned())
}
