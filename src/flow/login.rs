use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{AuthApi, SendOtpRequest, VerifyOtpRequest};
use crate::error::{AppError, AuthError, ValidationErrors};
use crate::identity::{is_valid_otp, Identifier, LoginMethod};
use crate::resolver::{CredentialResolver, DemoResolver, RemoteResolver};
use crate::session::{Session, SessionStore};
use crate::validate::{validate_login, LoginForm};

use super::{FlowConfig, FlowState, OtpChallenge};

/// What a successful step hands back to the caller.
#[derive(Debug)]
pub enum LoginOutcome {
    /// An OTP was sent; the flow now waits for [`LoginFlow::submit_otp`].
    OtpSent,
    /// Fully authenticated; the session has been persisted.
    Authenticated {
        session: Session,
        redirect: &'static str,
    },
    /// Forgot-password verification succeeded; the identifier carries
    /// forward into [`super::PasswordResetFlow::enter`].
    ResetVerified { identifier: Identifier },
}

/// Login state machine:
/// `Idle → Validating → (OtpRequested | AuthenticatingPassword) →
/// OtpVerifying → Authenticated | Failed`.
///
/// All network steps run to completion before the next transition; a simple
/// in-progress flag rejects re-entrant submission.
pub struct LoginFlow {
    api: Arc<AuthApi>,
    store: Arc<dyn SessionStore>,
    demo: Option<DemoResolver>,
    config: FlowConfig,
    method: LoginMethod,
    forgot_password: bool,
    state: FlowState,
    form: LoginForm,
    challenge: Option<OtpChallenge>,
    errors: ValidationErrors,
    in_progress: bool,
}

impl LoginFlow {
    pub fn new(api: Arc<AuthApi>, store: Arc<dyn SessionStore>, config: FlowConfig) -> Self {
        let demo = config.demo_bypass.then(DemoResolver::builtin);
        Self {
            api,
            store,
            demo,
            config,
            method: config.login_method,
            forgot_password: false,
            state: FlowState::Idle,
            form: LoginForm::default(),
            challenge: None,
            errors: ValidationErrors::new(),
            in_progress: false,
        }
    }

    /// Replace the demo allow-list (deployments may configure their own).
    pub fn with_demo_resolver(mut self, resolver: DemoResolver) -> Self {
        self.demo = Some(resolver);
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn method(&self) -> LoginMethod {
        self.method
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn pending_challenge(&self) -> Option<&OtpChallenge> {
        self.challenge.as_ref()
    }

    /// Switch login method. Discards any in-flight OTP challenge and clears
    /// error state; there is no other cancellation path.
    pub fn select_method(&mut self, method: LoginMethod) {
        self.method = method;
        self.forgot_password = false;
        self.challenge = None;
        self.errors = ValidationErrors::new();
        self.state = FlowState::Idle;
    }

    /// Engage the forgot-password sub-flow: the next submission sends a reset
    /// OTP instead of attempting a password login.
    pub fn begin_forgot_password(&mut self) {
        self.forgot_password = true;
        self.challenge = None;
        self.errors = ValidationErrors::new();
        self.state = FlowState::Idle;
    }

    /// Submit the credential form. Depending on method and sub-flow this
    /// either authenticates directly or requests an OTP first.
    pub async fn submit(&mut self, form: LoginForm) -> Result<LoginOutcome, AppError> {
        self.begin()?;
        let result = self.submit_inner(form).await;
        self.finish(&result);
        result
    }

    /// Submit the 6-digit code for a pending challenge.
    pub async fn submit_otp(&mut self, code: &str) -> Result<LoginOutcome, AppError> {
        self.begin()?;
        let result = self.submit_otp_inner(code).await;
        self.finish(&result);
        result
    }

    /// Re-send the pending challenge, replacing it.
    pub async fn resend_otp(&mut self) -> Result<(), AppError> {
        self.begin()?;
        let result = match self.challenge.as_ref() {
            Some(challenge) => {
                let target = challenge.target.clone();
                self.send_otp(target).await.map(|_| ())
            }
            None => Err(AuthError::NoPendingOtp.into()),
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

    fn finish(&mut self, result: &Result<LoginOutcome, AppError>) {
        self.in_progress = false;
        match result {
            Ok(LoginOutcome::Authenticated { .. }) => self.state = FlowState::Authenticated,
            // Hand-off to the reset flow; this machine is done
            Ok(LoginOutcome::ResetVerified { .. }) => self.state = FlowState::Idle,
            Ok(LoginOutcome::OtpSent) => {}
            Err(_) => self.state = FlowState::Failed,
        }
    }

    async fn submit_inner(&mut self, form: LoginForm) -> Result<LoginOutcome, AppError> {
        self.state = FlowState::Validating;
        self.errors = validate_login(&form, self.method, self.forgot_password);
        if !self.errors.is_empty() {
            return Err(self.errors.clone().into());
        }
        self.form = form;
        let identifier = self.identifier();

        // Demo identities bypass everything, including any OTP gate
        if !self.forgot_password && self.method != LoginMethod::Otp {
            if let Some(session) = self.try_demo(&identifier).await? {
                return self.complete(session).await;
            }
        }

        let needs_otp =
            self.forgot_password || self.method == LoginMethod::Otp || self.config.require_otp;
        if needs_otp {
            self.send_otp(identifier).await?;
            return Ok(LoginOutcome::OtpSent);
        }

        self.state = FlowState::AuthenticatingPassword;
        let session = self.authenticate_remote(&identifier).await?;
        self.complete(session).await
    }

    async fn submit_otp_inner(&mut self, code: &str) -> Result<LoginOutcome, AppError> {
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
        let request = VerifyOtpRequest::new(&challenge.target, code);
        if !self.api.verify_otp(&request).await? {
            // Challenge stays pending so the user can retry the same step
            return Err(AuthError::InvalidOtp.into());
        }

        if let Some(challenge) = self.challenge.as_mut() {
            challenge.verified = true;
        }

        if self.forgot_password {
            info!(identifier = challenge.target.value(), "Reset OTP verified");
            self.challenge = None;
            return Ok(LoginOutcome::ResetVerified {
                identifier: challenge.target,
            });
        }

        // OTP login completes against the login endpoint with whatever
        // password the form holds (empty for the passwordless method)
        self.state = FlowState::AuthenticatingPassword;
        let session = self.authenticate_remote(&challenge.target).await?;
        self.complete(session).await
    }

    fn identifier(&self) -> Identifier {
        match self.method {
            LoginMethod::Phone => Identifier::Phone(self.form.phone.clone()),
            LoginMethod::Email | LoginMethod::Otp => Identifier::Email(self.form.email.clone()),
        }
    }

    async fn try_demo(&self, identifier: &Identifier) -> Result<Option<Session>, AppError> {
        match self.demo.as_ref() {
            Some(resolver) => resolver.resolve(identifier, &self.form.password).await,
            None => Ok(None),
        }
    }

    async fn authenticate_remote(&self, identifier: &Identifier) -> Result<Session, AppError> {
        let resolver = RemoteResolver::new(Arc::clone(&self.api));
        let session = resolver
            .resolve(identifier, &self.form.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(session)
    }

    async fn send_otp(&mut self, identifier: Identifier) -> Result<(), AppError> {
        let request = SendOtpRequest::for_identifier(&identifier);
        let response = self.api.send_otp(&request).await.map_err(|e| {
            warn!(error = %e, "OTP request failed");
            e
        })?;
        self.challenge = Some(OtpChallenge::new(identifier, response.otp));
        self.state = FlowState::OtpRequested;
        Ok(())
    }

    async fn complete(&mut self, session: Session) -> Result<LoginOutcome, AppError> {
        self.store.save(&session).await?;
        self.challenge = None;
        let redirect = session.redirect_target();
        info!(username = %session.username, redirect, "Login successful");
        Ok(LoginOutcome::Authenticated { session, redirect })
    }
}
