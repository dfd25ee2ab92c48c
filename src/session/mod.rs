//! Session persistence.
//!
//! A [`Session`] is the only piece of flow state that outlives a single
//! authentication attempt. Stores expose exactly the two entries the rest of
//! the application reads: `token` (opaque bearer string) and `user`
//! (JSON-encoded username + role).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AppError;

pub const ROLE_RESTAURANT: &str = "ROLE_RESTAURANT";
pub const ROLE_USER: &str = "ROLE_USER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Restaurant,
    Other,
}

impl Role {
    pub fn parse(value: &str) -> Self {
        if value == ROLE_RESTAURANT {
            Role::Restaurant
        } else {
            Role::Other
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Restaurant => ROLE_RESTAURANT,
            Role::Other => ROLE_USER,
        }
    }

    /// Where a freshly authenticated user of this role lands.
    pub fn redirect_target(&self) -> &'static str {
        match self {
            Role::Restaurant => "/restaurant/dashboard",
            Role::Other => "/",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoleVisitor;

        impl<'de> Visitor<'de> for RoleVisitor {
            type Value = Role;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a role string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Role, E> {
                Ok(Role::parse(value))
            }
        }

        deserializer.deserialize_str(RoleVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(token: String, username: String, role: Role) -> Self {
        Self {
            token,
            username,
            role,
        }
    }

    pub fn redirect_target(&self) -> &'static str {
        self.role.redirect_target()
    }
}

/// Persistence seam for the session. Injected into the flows so nothing
/// reaches for ambient global state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, AppError>;
    async fn save(&self, session: &Session) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// In-memory store, for tests and short-lived tools.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, AppError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        *self.inner.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        *self.inner.write().await = None;
        Ok(())
    }
}

/// On-disk representation: the same two keys the web client keeps in
/// localStorage, with `user` holding a JSON string rather than an object.
#[derive(Serialize, Deserialize)]
struct StoredEntries {
    token: String,
    user: String,
}

#[derive(Serialize, Deserialize)]
struct StoredUser {
    username: String,
    role: Role,
}

/// File-backed store persisting the `token` and `user` entries as one JSON
/// document at a fixed path.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entries: StoredEntries = serde_json::from_str(&raw)?;
        let user: StoredUser = serde_json::from_str(&entries.user)?;
        Ok(Some(Session::new(entries.token, user.username, user.role)))
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        let user = serde_json::to_string(&StoredUser {
            username: session.username.clone(),
            role: session.role,
        })?;
        let entries = StoredEntries {
            token: session.token.clone(),
            user,
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
