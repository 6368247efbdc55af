//! Sessions: who is signed in, and notifications when that changes.

mod context;
mod database;
pub mod guard;
mod memory;

pub use context::SessionContext;
pub use database::DbSessionProvider;
pub use memory::MemorySessionProvider;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::shared::utils::generate_token;
use crate::security::PasswordError;

/// The signed-in user as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: CurrentUser,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: CurrentUser, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token(),
            user,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { token: String, user_id: Uuid },
    SignedOut { token: String },
    Expired { token: String },
    /// The subscriber fell behind and lost this many events.
    Missed(u64),
}

/// Live feed of session changes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(SessionEvent::Missed(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    pub fn unsubscribe(self) {}
}

/// Fan-out shared by the provider implementations.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }
}

impl SessionEvents {
    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Email ou mot de passe incorrect")]
    InvalidCredentials,
    #[error("Un compte existe déjà pour cet email")]
    EmailTaken,
    #[error("Adresse email invalide")]
    InvalidEmail,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Session service error: {0}")]
    Backend(String),
}

impl From<crate::core::records::BackendError> for AuthError {
    fn from(err: crate::core::records::BackendError) -> Self {
        Self::Backend(err.message)
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Live session for a token; expired or revoked tokens yield `None`.
    async fn current_session(&self, token: &str) -> Result<Option<Session>, AuthError>;

    async fn current_user(&self, token: &str) -> Result<Option<CurrentUser>, AuthError> {
        Ok(self.current_session(token).await?.map(|s| s.user))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Drops every ended session, emitting `Expired` for each one. Returns how
    /// many were dropped.
    async fn purge_expired(&self) -> Result<usize, AuthError>;

    fn on_session_change(&self) -> SessionSubscription;
}

pub(crate) fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}
