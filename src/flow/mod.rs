//! The authentication flow state machines.
//!
//! One parameterized flow per concern, replacing the divergent per-form
//! variants of the web client: [`LoginFlow`] for the three login methods,
//! [`PasswordResetFlow`] for the OTP-gated reset sub-flow, and
//! [`RegistrationFlow`] for restaurant and volunteer signup.

mod login;
mod register;
mod reset;

pub use login::{LoginFlow, LoginOutcome};
pub use register::{RegistrationFlow, RegistrationOutcome};
pub use reset::PasswordResetFlow;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::identity::{Identifier, LoginMethod};

pub const LOGIN_ROUTE: &str = "/login";
pub const RESET_ROUTE: &str = "/reset-password";

/// Flow policy knobs, one set for every form variant.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FlowConfig {
    /// Which identifier method the login form starts on.
    #[serde(default)]
    pub login_method: LoginMethod,
    /// Gate password logins behind OTP verification as well.
    #[serde(default)]
    pub require_otp: bool,
    /// Allow the demo credential allow-list to short-circuit the API.
    #[serde(default)]
    pub demo_bypass: bool,
}

/// Observable position of a flow between operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    OtpRequested,
    AuthenticatingPassword,
    OtpVerifying,
    Authenticated,
    Failed,
}

/// A pending OTP challenge. Lives only for the duration of one flow; replaced
/// wholesale on resend, consumed on verification.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub target: Identifier,
    pub sent_at: DateTime<Utc>,
    pub verified: bool,
    /// Code echoed back by dev-mode servers. Surfaced for diagnostics only.
    pub dev_otp: Option<String>,
}

impl OtpChallenge {
    pub fn new(target: Identifier, dev_otp: Option<String>) -> Self {
        Self {
            target,
            sent_at: Utc::now(),
            verified: false,
            dev_otp,
        }
    }
}

/// Typed navigation target, produced where a flow hands control back to the
/// application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect(pub &'static str);
