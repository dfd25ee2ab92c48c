use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{AuthApi, SendOtpRequest, VerifyOtpRequest};
use crate::error::{ApiError, AppError, AuthError, ValidationErrors};
use crate::identity::{is_valid_otp, Identifier};
use crate::validate::{
    validate_restaurant, validate_volunteer, RestaurantProfile, VolunteerProfile,
};

use super::{FlowState, OtpChallenge, LOGIN_ROUTE};

#[derive(Debug)]
pub enum RegistrationOutcome {
    /// OTP sent to the profile's contact details; awaiting
    /// [`RegistrationFlow::submit_otp`].
    OtpSent,
    /// Account created; the caller navigates to login.
    Registered { redirect: &'static str },
}

enum PendingRegistration {
    Restaurant(RestaurantProfile),
    Volunteer(VolunteerProfile),
}

impl PendingRegistration {
    fn email(&self) -> &str {
        match self {
            PendingRegistration::Restaurant(p) => &p.email,
            PendingRegistration::Volunteer(p) => &p.email,
        }
    }

    fn phone(&self) -> &str {
        match self {
            PendingRegistration::Restaurant(p) => &p.phone,
            PendingRegistration::Volunteer(p) => &p.phone,
        }
    }
}

/// OTP-gated registration, applied uniformly to restaurant and volunteer
/// signup: validate, send an OTP to the submitted email and phone, verify,
/// then transmit the profile once. The profile is not retained after success.
pub struct RegistrationFlow {
    api: Arc<AuthApi>,
    state: FlowState,
    pending: Option<PendingRegistration>,
    challenge: Option<OtpChallenge>,
    errors: ValidationErrors,
    in_progress: bool,
}

impl RegistrationFlow {
    pub fn new(api: Arc<AuthApi>) -> Self {
        Self {
            api,
            state: FlowState::Idle,
            pending: None,
            challenge: None,
            errors: ValidationErrors::new(),
            in_progress: false,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Field errors from the last step, local and server-side merged.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn pending_challenge(&self) -> Option<&OtpChallenge> {
        self.challenge.as_ref()
    }

    pub async fn submit_restaurant(
        &mut self,
        profile: RestaurantProfile,
    ) -> Result<RegistrationOutcome, AppError> {
        let errors = validate_restaurant(&profile);
        self.start(errors, PendingRegistration::Restaurant(profile))
            .await
    }

    pub async fn submit_volunteer(
        &mut self,
        profile: VolunteerProfile,
    ) -> Result<RegistrationOutcome, AppError> {
        let errors = validate_volunteer(&profile);
        self.start(errors, PendingRegistration::Volunteer(profile))
            .await
    }

    /// Verify the pending challenge and, on success, transmit the profile.
    pub async fn submit_otp(&mut self, code: &str) -> Result<RegistrationOutcome, AppError> {
        self.begin()?;
        let result = self.submit_otp_inner(code).await;
        self.end(&result);
        result
    }

    /// Re-send the pending challenge, replacing it.
    pub async fn resend_otp(&mut self) -> Result<(), AppError> {
        self.begin()?;
        let result = match (&self.challenge, &self.pending) {
            (Some(challenge), Some(pending)) => {
                let target = challenge.target.clone();
                let mut request = SendOtpRequest::for_identifier(&target);
                request.phone = Some(pending.phone().to_string());
                match self.api.send_otp(&request).await {
                    Ok(response) => {
                        self.challenge = Some(OtpChallenge::new(target, response.otp));
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            _ => Err(AuthError::NoPendingOtp.into()),
        };
        self.in_progress = false;
        result
    }

    fn begin(&mut self) -> Result<(), AppError> {
        if self.in_progress {
            return Err(AuthError::InProgress.into());
        }
        self.in_progress = true;
        Ok(())
    }

    fn end(&mut self, result: &Result<RegistrationOutcome, AppError>) {
        self.in_progress = false;
        if result.is_err() {
            self.state = FlowState::Failed;
        }
    }

    async fn start(
        &mut self,
        errors: ValidationErrors,
        pending: PendingRegistration,
    ) -> Result<RegistrationOutcome, AppError> {
        self.begin()?;
        let result = self.start_inner(errors, pending).await;
        self.end(&result);
        result
    }

    async fn start_inner(
        &mut self,
        errors: ValidationErrors,
        pending: PendingRegistration,
    ) -> Result<RegistrationOutcome, AppError> {
        self.state = FlowState::Validating;
        self.errors = errors;
        if !self.errors.is_empty() {
            return Err(self.errors.clone().into());
        }

        // Registration sends the OTP to both contact channels
        let target = Identifier::Email(pending.email().to_string());
        let mut request = SendOtpRequest::for_identifier(&target);
        request.phone = Some(pending.phone().to_string());

        let response = self.api.send_otp(&request).await?;
        self.challenge = Some(OtpChallenge::new(target, response.otp));
        self.pending = Some(pending);
        self.state = FlowState::OtpRequested;
        Ok(RegistrationOutcome::OtpSent)
    }

    async fn submit_otp_inner(&mut self, code: &str) -> Result<RegistrationOutcome, AppError> {
        let challenge = self
            .challenge
            .as_ref()
            .ok_or(AuthError::NoPendingOtp)?
            .clone();

        self.errors = ValidationErrors::new();
        if code.is_empty() {
            self.errors.add("otp", "Please enter the OTP");
        } else if !is_valid_otp(code) {
            self.errors.add("otp", "OTP must be 6 digits");
        }
        if !self.errors.is_empty() {
            return Err(self.errors.clone().into());
        }

        self.state = FlowState::OtpVerifying;
        // The challenge targets the email; verification follows suit
        let request = VerifyOtpRequest::new(&challenge.target, code);
        if !self.api.verify_otp(&request).await? {
            // Challenge stays pending so the user can retry the same step
            return Err(AuthError::InvalidOtp.into());
        }

        let pending = self
            .pending
            .take()
            .ok_or_else(|| AppError::InternalError("no profile pending registration".into()))?;

        match self.register(&pending).await {
            Ok(outcome) => {
                self.challenge = None;
                self.state = FlowState::Authenticated;
                Ok(outcome)
            }
            Err(e) => {
                // Keep the profile so the whole step can be retried
                self.pending = Some(pending);
                Err(e)
            }
        }
    }

    async fn register(
        &mut self,
        pending: &PendingRegistration,
    ) -> Result<RegistrationOutcome, AppError> {
        match pending {
            PendingRegistration::Restaurant(profile) => {
                let response = self.api.register_restaurant(profile).await?;
                if !response.success {
                    // Field-level server errors merge into the local map
                    if !response.errors.is_empty() {
                        warn!(
                            fields = response.errors.len(),
                            "Registration rejected with field errors"
                        );
                        self.errors.merge(response.errors);
                        return Err(self.errors.clone().into());
                    }
                    return Err(AppError::ApiError(ApiError::Rejected {
                        message: response.message.clone().unwrap_or_else(|| {
                            "Failed to register restaurant. Please try again.".to_string()
                        }),
                    }));
                }
                info!(restaurant = %profile.restaurant_name, "Restaurant registered");
            }
            PendingRegistration::Volunteer(profile) => {
                self.api.signup_volunteer(profile).await?;
                info!(name = %profile.name, "Volunteer registered");
            }
        }
        Ok(RegistrationOutcome::Registered {
            redirect: LOGIN_ROUTE,
        })
    }
}
