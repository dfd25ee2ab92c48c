//! Identifier handling for the authentication flows.
//!
//! An identifier is the thing a user logs in with: an email address,
//! a 10-digit phone number, or a plain username. Format rules must hold
//! before any request carrying the identifier leaves the client.

use serde::{Deserialize, Serialize};

/// How the login form is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// Email + password
    Email,
    /// Phone + password
    Phone,
    /// Passwordless, OTP only
    Otp,
}

impl Default for LoginMethod {
    fn default() -> Self {
        LoginMethod::Email
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Identifier {
    Email(String),
    Phone(String),
    Username(String),
}

impl Identifier {
    pub fn value(&self) -> &str {
        match self {
            Identifier::Email(v) | Identifier::Phone(v) | Identifier::Username(v) => v,
        }
    }

    /// Whether the held value satisfies the format rules for its kind.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Identifier::Email(v) => is_valid_email(v),
            Identifier::Phone(v) => is_valid_phone(v),
            Identifier::Username(v) => !v.trim().is_empty(),
        }
    }

    /// Compare against a raw identifier string. Emails match
    /// case-insensitively; phone numbers and usernames match exactly.
    pub fn matches(&self, other: &str) -> bool {
        match self {
            Identifier::Email(v) => v.eq_ignore_ascii_case(other),
            Identifier::Phone(v) | Identifier::Username(v) => v == other,
        }
    }

    /// The email component for wire payloads, if this is an email.
    pub fn email(&self) -> Option<&str> {
        match self {
            Identifier::Email(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The phone component for wire payloads, if this is a phone number.
    pub fn phone(&self) -> Option<&str> {
        match self {
            Identifier::Phone(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Loose email shape: something before '@', something after containing a dot,
/// no whitespace anywhere.
pub fn is_valid_email(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Exactly 10 ASCII digits.
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.chars().all(|c| c.is_ascii_digit())
}

/// Exactly 6 ASCII digits.
pub fn is_valid_otp(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_digit())
}

/// Exactly 6 ASCII digits.
pub fn is_valid_pincode(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_digit())
}
