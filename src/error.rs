use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("API error: {0}")]
    ApiError(#[from] ApiError),

    #[error("Validation failed: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Implement conversion from reqwest::Error
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ApiError(ApiError::RequestFailed(err.to_string()))
    }
}

// Session stores read and write through std::io
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl AppError {
    /// The single-line message shown to the user for this failure.
    /// API rejections carry the server-supplied message when one exists.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ApiError(e) => e.user_message().to_string(),
            AppError::AuthError(e) => e.to_string(),
            AppError::ValidationError(_) => "Please fix the highlighted fields".to_string(),
            _ => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid OTP. Please try again.")]
    InvalidOtp,

    #[error("No OTP challenge is pending")]
    NoPendingOtp,

    #[error("OTP verification required")]
    NotVerified,

    #[error("Another request is already in progress")]
    InProgress,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("{message}")]
    Rejected { message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Rejected { message } => message,
            _ => "Something went wrong. Please try again later.",
        }
    }
}

/// Field-keyed validation errors, matching the error map the forms render.
/// Server-side field errors returned on registration merge into the same map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.fields.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Merge another error map in, server entries winning on conflict.
    pub fn merge(&mut self, other: BTreeMap<String, String>) {
        self.fields.extend(other);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::StorageError(_)));

        // Test config error conversion
        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        // Test validation error conversion
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email is required");
        let app_err: AppError = errors.into();
        assert!(matches!(app_err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = AppError::ApiError(ApiError::Rejected {
            message: "Invalid credentials".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid credentials");

        let err = AppError::ApiError(ApiError::RequestFailed("connection refused".to_string()));
        assert_eq!(
            err.user_message(),
            "Something went wrong. Please try again later."
        );
    }

    #[test]
    fn test_validation_errors_map() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email is invalid");
        errors.add("phone", "Phone number must be 10 digits");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some("Email is invalid"));
        assert_eq!(errors.get("password"), None);

        let mut server = BTreeMap::new();
        server.insert("email".to_string(), "Email already registered".to_string());
        errors.merge(server);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some("Email already registered"));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Authentication error: Invalid credentials");

        let mut errors = ValidationErrors::new();
        errors.add("password", "Password is required");
        assert_eq!(errors.to_string(), "password: Password is required");
    }
}
