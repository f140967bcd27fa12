use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::auth::dto::AuthRequest;

/// First failing login form rule, with the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Name is required")]
    NameRequired,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Password must not exceed 20 characters")]
    PasswordTooLong,
    #[error("Password must contain at least one uppercase letter")]
    PasswordNeedsUppercase,
    #[error("Password must contain at least one number")]
    PasswordNeedsDigit,
}

/// Same acceptance as zod's `string().email()`: no leading dot or `..` in the
/// address, dotted domain labels not starting with `-`, and a TLD of two or
/// more letters.
pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$").unwrap();
    }
    !email.starts_with('.') && !email.contains("..") && EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.is_empty() {
            return Err(FormError::NameRequired);
        }
        if !is_valid_email(&self.email) {
            return Err(FormError::InvalidEmail);
        }
        let len = self.password.chars().count();
        if len < 8 {
            return Err(FormError::PasswordTooShort);
        }
        if len > 20 {
            return Err(FormError::PasswordTooLong);
        }
        if !self.password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(FormError::PasswordNeedsUppercase);
        }
        if !self.password.chars().any(|c| c.is_ascii_digit()) {
            return Err(FormError::PasswordNeedsDigit);
        }
        Ok(())
    }

    pub fn to_request(&self) -> AuthRequest {
        AuthRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}
