//! Credential resolution strategies.
//!
//! The login flow asks a chain of resolvers for a session before falling back
//! to the remote API. The demo resolver answers from a fixed allow-list and
//! never touches the network; it only runs when explicitly enabled.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use rand::RngCore;
use serde::Deserialize;
use tracing::info;

use crate::api::{AuthApi, LoginRequest};
use crate::error::AppError;
use crate::identity::Identifier;
use crate::session::{Role, Session, ROLE_RESTAURANT};

/// A resolver either produces a session, declines (`None`, try the next
/// one), or fails the attempt outright.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(
        &self,
        identifier: &Identifier,
        password: &str,
    ) -> Result<Option<Session>, AppError>;
}

/// One allow-listed demo identity.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoUser {
    pub identifier: String,
    pub password: String,
    pub role: String,
}

impl DemoUser {
    pub fn new(identifier: &str, password: &str, role: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }
}

pub struct DemoResolver {
    users: Vec<DemoUser>,
}

impl DemoResolver {
    pub fn new(users: Vec<DemoUser>) -> Self {
        Self { users }
    }

    /// The demo identities shipped with the platform.
    pub fn builtin() -> Self {
        Self::new(vec![DemoUser::new(
            "tasty@bites.com",
            "tasty123",
            ROLE_RESTAURANT,
        )])
    }

    fn synthesize_token() -> String {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("demo-{}", BASE64.encode(bytes))
    }
}

#[async_trait]
impl CredentialResolver for DemoResolver {
    async fn resolve(
        &self,
        identifier: &Identifier,
        password: &str,
    ) -> Result<Option<Session>, AppError> {
        let matched = self
            .users
            .iter()
            .find(|user| identifier.matches(&user.identifier) && user.password == password);

        let Some(user) = matched else {
            return Ok(None);
        };

        info!(identifier = %user.identifier, "Demo identity matched, bypassing remote API");
        Ok(Some(Session::new(
            Self::synthesize_token(),
            user.identifier.clone(),
            Role::parse(&user.role),
        )))
    }
}

/// Delegates to the remote login endpoint.
pub struct RemoteResolver {
    api: Arc<AuthApi>,
}

impl RemoteResolver {
    pub fn new(api: Arc<AuthApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CredentialResolver for RemoteResolver {
    async fn resolve(
        &self,
        identifier: &Identifier,
        password: &str,
    ) -> Result<Option<Session>, AppError> {
        let request = LoginRequest::new(identifier, password);
        let response = self.api.login(&request).await?;

        // login() only succeeds with a token present
        let token = response
            .token
            .ok_or_else(|| AppError::InternalError("login response lost its token".to_string()))?;
        let username = response
            .username
            .unwrap_or_else(|| identifier.value().to_string());
        let role = Role::parse(response.role.as_deref().unwrap_or(""));

        Ok(Some(Session::new(token, username, role)))
    }
}
