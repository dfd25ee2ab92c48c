//! HTTP client for the remote auth API.
//!
//! All endpoints take and return JSON. Failures prefer the server-supplied
//! `message` field; anything else collapses into a generic retryable error.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::{ApiError, AppError};
use crate::identity::Identifier;
use crate::validate::{RestaurantProfile, VolunteerProfile};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Default)]
pub struct SendOtpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SendOtpRequest {
    pub fn for_identifier(identifier: &Identifier) -> Self {
        Self {
            email: identifier.email().map(str::to_string),
            phone: identifier.phone().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: Option<String>,
    /// Dev-mode servers echo the generated code. Never auto-filled anywhere.
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub otp: String,
}

impl VerifyOtpRequest {
    pub fn new(identifier: &Identifier, otp: &str) -> Self {
        Self {
            email: identifier.email().map(str::to_string),
            phone: identifier.phone().map(str::to_string),
            otp: otp.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn new(identifier: &Identifier, password: &str) -> Self {
        let username = match identifier {
            Identifier::Username(v) => Some(v.clone()),
            _ => None,
        };
        Self {
            username,
            email: identifier.email().map(str::to_string),
            phone: identifier.phone().map(str::to_string),
            password: password.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub message: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    pub id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub message: Option<String>,
    /// Server-side field validation errors, keyed by form field name.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

pub struct AuthApi {
    client: reqwest::Client,
    base_url: Url,
}

impl AuthApi {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid API base URL: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub async fn send_otp(&self, request: &SendOtpRequest) -> Result<SendOtpResponse, AppError> {
        info!(
            email = request.email.as_deref().unwrap_or(""),
            phone = request.phone.as_deref().unwrap_or(""),
            "Requesting OTP"
        );
        let response: SendOtpResponse = self.post_json("api/auth/send-otp", request).await?;
        if !response.success {
            return Err(rejected(
                response.message,
                "Failed to send OTP. Please try again.",
            ));
        }
        Ok(response)
    }

    /// Returns Ok(true) when the code was accepted, Ok(false) when the server
    /// rejected it as invalid or expired.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<bool, AppError> {
        let response: ApiStatus = self.post_json("api/auth/verify-otp", request).await?;
        if !response.success {
            warn!(
                message = response.message.as_deref().unwrap_or("Invalid OTP"),
                "OTP verification rejected"
            );
        }
        Ok(response.success)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let response: LoginResponse = self.post_json("api/auth/login", request).await?;
        if !response.success || response.token.is_none() {
            return Err(rejected(
                response.message,
                "Invalid credentials. Please try again.",
            ));
        }
        Ok(response)
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), AppError> {
        let response: ApiStatus = self.post_json("api/auth/reset-password", request).await?;
        if !response.success {
            return Err(rejected(
                response.message,
                "Failed to reset password. Please try again.",
            ));
        }
        Ok(())
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, AppError> {
        self.post_json("api/auth/signup", request).await
    }

    pub async fn register_restaurant(
        &self,
        profile: &RestaurantProfile,
    ) -> Result<RegisterResponse, AppError> {
        self.post_json("api/restaurants/register", profile).await
    }

    /// Volunteer signup goes through the generic signup endpoint with an
    /// explicit role list.
    pub async fn signup_volunteer(
        &self,
        profile: &VolunteerProfile,
    ) -> Result<SignupResponse, AppError> {
        let request = SignupRequest {
            username: profile.name.clone(),
            email: profile.email.clone(),
            password: profile.password.clone(),
            role: vec!["ROLE_VOLUNTEER".to_string()],
        };
        self.signup(&request).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InternalError(format!("Bad endpoint path {}: {}", path, e)))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            // Error bodies may still carry a usable message field
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ApiError(error_from_body(status, &body)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            AppError::ApiError(ApiError::UnexpectedResponse(format!(
                "{} returned malformed JSON: {}",
                path, e
            )))
        })
    }
}

fn rejected(message: Option<String>, fallback: &str) -> AppError {
    AppError::ApiError(ApiError::Rejected {
        message: message.unwrap_or_else(|| fallback.to_string()),
    })
}

fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return ApiError::Rejected { message };
    }
    ApiError::RequestFailed(format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_otp_payload_shapes() {
        let email = Identifier::Email("a@b.com".to_string());
        let json = serde_json::to_value(SendOtpRequest::for_identifier(&email)).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "a@b.com" }));

        let phone = Identifier::Phone("9876543210".to_string());
        let json = serde_json::to_value(SendOtpRequest::for_identifier(&phone)).unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "9876543210" }));
    }

    #[test]
    fn test_login_payload_omits_absent_fields() {
        let request = LoginRequest::new(&Identifier::Email("a@b.com".to_string()), "secret");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": "a@b.com", "password": "secret" })
        );

        let request = LoginRequest::new(&Identifier::Username("tasty".to_string()), "secret");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "username": "tasty", "password": "secret" })
        );
    }

    #[test]
    fn test_login_response_defaults_success() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token": "jwt", "username": "tasty@bites.com", "role": "ROLE_RESTAURANT"}"#,
        )
        .unwrap();
        assert!(response.success);
        assert_eq!(response.token.as_deref(), Some("jwt"));
    }

    #[test]
    fn test_error_body_message_preferred() {
        let err = error_from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "Invalid credentials"}"#,
        );
        assert!(matches!(err, ApiError::Rejected { ref message } if message == "Invalid credentials"));

        let err = error_from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }

    #[test]
    fn test_register_response_field_errors() {
        let response: RegisterResponse = serde_json::from_str(
            r#"{"success": false, "errors": {"email": "Email already registered"}}"#,
        )
        .unwrap();
        assert!(!response.success);
        assert_eq!(
            response.errors.get("email").map(String::as_str),
            Some("Email already registered")
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(AuthApi::new("not a url").is_err());
        assert!(AuthApi::new("http://localhost:8080/").is_ok());
    }
}
