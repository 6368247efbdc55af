use async_trait::async_trait;
use chrono::Duration;
use log::{debug, info};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    normalize_email, AuthError, CurrentUser, Session, SessionEvent, SessionEvents,
    SessionProvider, SessionSubscription,
};
use crate::security::PasswordHasher;

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    email: String,
    password_hash: String,
}

/// Accounts and sessions held in process memory.
#[derive(Debug)]
pub struct MemorySessionProvider {
    hasher: PasswordHasher,
    ttl: Duration,
    users: RwLock<HashMap<String, StoredUser>>,
    sessions: RwLock<HashMap<String, Session>>,
    events: SessionEvents,
}

impl MemorySessionProvider {
    pub fn new(hasher: PasswordHasher, ttl: Duration) -> Self {
        Self {
            hasher,
            ttl,
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            events: SessionEvents::default(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn open_session(&self, user: &StoredUser) -> Session {
        let session = Session::new(
            CurrentUser {
                id: user.id,
                email: user.email.clone(),
            },
            self.ttl,
        );
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        self.events.emit(SessionEvent::SignedIn {
            token: session.token.clone(),
            user_id: user.id,
        });
        session
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        self.hasher.validate(password)?;
        let password_hash = self.hasher.hash(password)?;

        let user = {
            let mut users = self.users.write().await;
            if users.contains_key(&email) {
                return Err(AuthError::EmailTaken);
            }
            let user = StoredUser {
                id: Uuid::new_v4(),
                email: email.clone(),
                password_hash,
            };
            users.insert(email, user.clone());
            user
        };

        info!("Registered user {}", user.id);
        Ok(self.open_session(&user).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .users
            .read()
            .await
            .get(&email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            debug!("Rejected password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        Ok(self.open_session(&user).await)
    }

    async fn current_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let session = self.sessions.read().await.get(token).cloned();
        match session {
            Some(session) if session.is_expired() => {
                self.sessions.write().await.remove(token);
                self.events.emit(SessionEvent::Expired {
                    token: token.to_string(),
                });
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        if self.sessions.write().await.remove(token).is_some() {
            self.events.emit(SessionEvent::SignedOut {
                token: token.to_string(),
            });
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let mut expired = Vec::new();
        self.sessions.write().await.retain(|token, session| {
            let ended = session.is_expired();
            if ended {
                expired.push(token.clone());
            }
            !ended
        });
        for token in &expired {
            self.events.emit(SessionEvent::Expired {
                token: token.clone(),
            });
        }
        Ok(expired.len())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
