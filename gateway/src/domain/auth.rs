//! Authentication primitives such as login credentials.
//!
//! Credentials are validated here, before any handler talks to the identity
//! port, so malformed logins never reach the practice backend.

use zeroize::Zeroizing;

use super::forms::ValidationError;
use super::formatting::normalize_phone_number;

/// Minimum accepted password length.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Phone number was missing or blank once trimmed.
    #[error("Phone number is required.")]
    EmptyPhone,
    /// Phone number is not a valid mobile number.
    #[error("Invalid phone number.")]
    InvalidPhone,
    /// Password was blank.
    #[error("Password is required.")]
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },
}

impl LoginValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyPhone | Self::InvalidPhone => "phone",
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
        }
    }

    /// Convert into the field-level error shape shared with the form engine.
    pub fn to_validation_error(&self) -> ValidationError {
        ValidationError::new(self.field(), [self.to_string()])
    }
}

/// Validated login credentials used by the identity port.
///
/// ## Invariants
/// - `phone` is normalised to `01XXXXXXXXX`.
/// - `password` is at least [`PASSWORD_MIN_LEN`] characters and retains
///   caller-provided whitespace.
///
/// # Examples
/// ```
/// use gateway::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("+8801712345678", "password1", true).unwrap();
/// assert_eq!(creds.phone(), "01712345678");
/// assert!(creds.remember_me());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    phone: String,
    password: Zeroizing<String>,
    remember_me: bool,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(
        phone: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Self, LoginValidationError> {
        let trimmed = phone.trim();
        if trimmed.is_empty() {
            return Err(LoginValidationError::EmptyPhone);
        }
        let phone = normalize_phone_number(trimmed).ok_or(LoginValidationError::InvalidPhone)?;

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(LoginValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }

        Ok(Self {
            phone,
            password: Zeroizing::new(password.to_owned()),
            remember_me,
        })
    }

    /// Canonical phone number.
    pub fn phone(&self) -> &str {
        self.phone.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Whether long-lived cookies were requested.
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    /// URL-encoded form fields posted to the backend login endpoint.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("phone".to_owned(), self.phone.clone()),
            ("password".to_owned(), self.password.as_str().to_owned()),
            ("remember_me".to_owned(), self.remember_me.to_string()),
        ]
    }
}

/// Validated phone number used by verification and password-reset flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRequest {
    phone: String,
}

impl PhoneRequest {
    /// Validate a raw phone number.
    pub fn try_new(phone: &str) -> Result<Self, LoginValidationError> {
        let trimmed = phone.trim();
        if trimmed.is_empty() {
            return Err(LoginValidationError::EmptyPhone);
        }
        normalize_phone_number(trimmed)
            .map(|phone| Self { phone })
            .ok_or(LoginValidationError::InvalidPhone)
    }

    /// Canonical phone number.
    pub fn phone(&self) -> &str {
        self.phone.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "password1", LoginValidationError::EmptyPhone)]
    #[case("   ", "password1", LoginValidationError::EmptyPhone)]
    #[case("12345", "password1", LoginValidationError::InvalidPhone)]
    #[case("017১২৩৪৫৬৭৮", "password1", LoginValidationError::InvalidPhone)]
    #[case("01712345678", "", LoginValidationError::EmptyPassword)]
    #[case(
        "01712345678",
        "short",
        LoginValidationError::PasswordTooShort { min: PASSWORD_MIN_LEN }
    )]
    fn invalid_credentials(
        #[case] phone: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(phone, password, false)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(LoginValidationError::EmptyPhone, "phone", "Phone number is required.")]
    #[case(LoginValidationError::InvalidPhone, "phone", "Invalid phone number.")]
    #[case(LoginValidationError::EmptyPassword, "password", "Password is required.")]
    fn errors_render_user_facing_messages(
        #[case] err: LoginValidationError,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        assert_eq!(err.field(), field);
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn short_password_maps_to_password_field() {
        let err = LoginCredentials::try_from_parts("01712345678", "short", false)
            .expect_err("short password");
        let field_error = err.to_validation_error();
        assert_eq!(field_error.field, "password");
        assert_eq!(
            field_error.messages,
            vec!["Password must be at least 8 characters.".to_owned()]
        );
    }

    #[test]
    fn form_fields_carry_remember_flag() {
        let creds =
            LoginCredentials::try_from_parts(" 01712345678 ", "password1", true).expect("valid");
        assert_eq!(
            creds.form_fields(),
            vec![
                ("phone".to_owned(), "01712345678".to_owned()),
                ("password".to_owned(), "password1".to_owned()),
                ("remember_me".to_owned(), "true".to_owned()),
            ]
        );
    }

    #[test]
    fn phone_request_normalises() {
        let request = PhoneRequest::try_new("+880 1812 345678").expect("valid");
        assert_eq!(request.phone(), "01812345678");
        assert_eq!(
            PhoneRequest::try_new("abc"),
            Err(LoginValidationError::InvalidPhone)
        );
    }
}
