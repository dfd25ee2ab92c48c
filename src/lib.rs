pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod identity;
pub mod resolver;
pub mod session;
pub mod validate;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use api::AuthApi;
pub use flow::{
    FlowConfig, FlowState, LoginFlow, LoginOutcome, OtpChallenge, PasswordResetFlow, Redirect,
    RegistrationFlow, RegistrationOutcome,
};
pub use identity::{Identifier, LoginMethod};
pub use resolver::{CredentialResolver, DemoResolver, DemoUser, RemoteResolver};
pub use session::{
    FileSessionStore, MemorySessionStore, Role, Session, SessionStore,
};
pub use validate::{LoginForm, ResetForm, RestaurantProfile, VolunteerProfile};
