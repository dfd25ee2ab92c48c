//! Client-side form validation.
//!
//! Validation is an all-or-nothing precondition: every rule for the active
//! form runs, failures land in a field-keyed [`ValidationErrors`] map, and a
//! non-empty map blocks submission before any network call is made.

use serde::Serialize;

use crate::error::ValidationErrors;
use crate::identity::{is_valid_email, is_valid_phone, is_valid_pincode, LoginMethod};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields of the login form. Which ones apply depends on the active method
/// and whether the forgot-password sub-flow is engaged.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// New password + confirmation for the reset step.
#[derive(Debug, Clone, Default)]
pub struct ResetForm {
    pub password: String,
    pub confirm_password: String,
}

/// Restaurant registration profile. Serialized as-is to the registration
/// endpoint, so field names follow the API's camelCase contract.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantProfile {
    pub restaurant_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cuisine_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub opening_hours: String,
}

/// Volunteer signup profile, routed through the signup endpoint.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub availability: String,
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
}

/// Validate the login form for the given method. `forgot_password` drops the
/// password requirement, since the reset sub-flow collects it later.
pub fn validate_login(
    form: &LoginForm,
    method: LoginMethod,
    forgot_password: bool,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match method {
        LoginMethod::Phone => check_phone(&mut errors, &form.phone),
        // OTP login and the forgot-password entry both key off the email field
        LoginMethod::Email | LoginMethod::Otp => check_email(&mut errors, &form.email),
    }

    if !forgot_password && method != LoginMethod::Otp && form.password.is_empty() {
        errors.add("password", "Password is required");
    }

    errors
}

pub fn validate_reset(form: &ResetForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_password(&mut errors, &form.password);
    if form.password != form.confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }
    errors
}

pub fn validate_restaurant(profile: &RestaurantProfile) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if profile.restaurant_name.is_empty() {
        errors.add("restaurantName", "Restaurant name is required");
    }
    if profile.owner_name.is_empty() {
        errors.add("ownerName", "Owner name is required");
    }

    check_email(&mut errors, &profile.email);
    check_phone(&mut errors, &profile.phone);
    check_password(&mut errors, &profile.password);
    if profile.password != profile.confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }

    if profile.address.is_empty() {
        errors.add("address", "Address is required");
    }
    if profile.city.is_empty() {
        errors.add("city", "City is required");
    }
    if profile.state.is_empty() {
        errors.add("state", "State is required");
    }
    if profile.pincode.is_empty() {
        errors.add("pincode", "Pincode is required");
    } else if !is_valid_pincode(&profile.pincode) {
        errors.add("pincode", "Pincode must be 6 digits");
    }

    errors
}

pub fn validate_volunteer(profile: &VolunteerProfile) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if profile.name.is_empty() {
        errors.add("name", "Name is required");
    }
    check_email(&mut errors, &profile.email);
    check_phone(&mut errors, &profile.phone);
    if profile.city.is_empty() {
        errors.add("city", "City is required");
    }
    check_password(&mut errors, &profile.password);
    if profile.password != profile.confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }

    errors
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Email is invalid");
    }
}

fn check_phone(errors: &mut ValidationErrors, phone: &str) {
    if phone.is_empty() {
        errors.add("phone", "Phone number is required");
    } else if !is_valid_phone(phone) {
        errors.add("phone", "Phone number must be 10 digits");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.len() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
}
