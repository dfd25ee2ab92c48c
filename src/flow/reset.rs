use std::sync::Arc;

use tracing::info;

use crate::api::{AuthApi, ResetPasswordRequest};
use crate::error::{AppError, AuthError, ValidationErrors};
use crate::identity::Identifier;
use crate::validate::{validate_reset, ResetForm};

use super::{Redirect, LOGIN_ROUTE};

/// Password reset sub-flow:
/// `OtpVerified(identifier) → PasswordReset → Redirect(login)`.
///
/// Entry requires the verified identifier produced by the login flow's
/// forgot-password OTP verification. Arriving without one is an invalid
/// state and redirects straight back to login; this is enforced here, not
/// left to the caller's navigation.
pub struct PasswordResetFlow {
    api: Arc<AuthApi>,
    identifier: Identifier,
    errors: ValidationErrors,
    in_progress: bool,
}

impl PasswordResetFlow {
    /// Guarded entry point. `verified` is the identifier carried out of
    /// [`super::LoginOutcome::ResetVerified`]; `None` means the caller got
    /// here some other way and is sent back to login.
    pub fn enter(api: Arc<AuthApi>, verified: Option<Identifier>) -> Result<Self, Redirect> {
        match verified {
            Some(identifier) => Ok(Self {
                api,
                identifier,
                errors: ValidationErrors::new(),
                in_progress: false,
            }),
            None => Err(Redirect(LOGIN_ROUTE)),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validate and submit the new password. Success redirects to login.
    pub async fn submit(&mut self, form: ResetForm) -> Result<Redirect, AppError> {
        if self.in_progress {
            return Err(AuthError::InProgress.into());
        }
        self.in_progress = true;
        let result = self.submit_inner(form).await;
        self.in_progress = false;
        result
    }

    async fn submit_inner(&mut self, form: ResetForm) -> Result<Redirect, AppError> {
        self.errors = validate_reset(&form);
        if !self.errors.is_empty() {
            return Err(self.errors.clone().into());
        }

        let request = ResetPasswordRequest {
            email: self.identifier.email().map(str::to_string),
            phone: self.identifier.phone().map(str::to_string),
            password: form.password,
        };
        self.api.reset_password(&request).await?;

        info!(identifier = self.identifier.value(), "Password reset complete");
        Ok(Redirect(LOGIN_ROUTE))
    }
}
