use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use log::{debug, info};
use uuid::Uuid;

use super::{
    normalize_email, AuthError, CurrentUser, Session, SessionEvent, SessionEvents,
    SessionProvider, SessionSubscription,
};
use crate::core::records::BackendError;
use crate::core::shared::schema::{auth_sessions, auth_users};
use crate::core::shared::utils::DbPool;
use crate::security::PasswordHasher;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = auth_users)]
struct DbAuthUser {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = auth_sessions)]
struct DbAuthSession {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<&Session> for DbAuthSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user_id: session.user.id,
            created_at: session.created_at,
            expires_at: session.expires_at,
            revoked_at: None,
        }
    }
}

/// Accounts in `auth_users`, sessions in `auth_sessions`.
pub struct DbSessionProvider {
    pool: DbPool,
    hasher: PasswordHasher,
    ttl: Duration,
    events: SessionEvents,
}

impl DbSessionProvider {
    pub fn new(pool: DbPool, hasher: PasswordHasher, ttl: Duration) -> Self {
        Self {
            pool,
            hasher,
            ttl,
            events: SessionEvents::default(),
        }
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection, &PasswordHasher) -> Result<T, AuthError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(BackendError::from)?;
            work(&mut *conn, &hasher)
        })
        .await
        .map_err(|e| AuthError::Backend(e.to_string()))?
    }

    fn opened(&self, session: Session) -> Session {
        self.events.emit(SessionEvent::SignedIn {
            token: session.token.clone(),
            user_id: session.user.id,
        });
        session
    }
}

fn db_error(err: diesel::result::Error) -> AuthError {
    AuthError::from(BackendError::from(err))
}

/// A concurrent sign-up for the same email loses on the unique index.
fn sign_up_error(err: diesel::result::Error) -> AuthError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AuthError::EmailTaken
        }
        other => db_error(other),
    }
}

#[async_trait]
impl SessionProvider for DbSessionProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        let password = password.to_string();
        let ttl = self.ttl;

        let session = self
            .blocking(move |conn, hasher| {
                hasher.validate(&password)?;
                let taken = auth_users::table
                    .filter(auth_users::email.eq(&email))
                    .count()
                    .get_result::<i64>(conn)
                    .map_err(db_error)?;
                if taken > 0 {
                    return Err(AuthError::EmailTaken);
                }

                let user = DbAuthUser {
                    id: Uuid::new_v4(),
                    email,
                    password_hash: hasher.hash(&password)?,
                    created_at: Utc::now(),
                };
                let session = Session::new(
                    CurrentUser {
                        id: user.id,
                        email: user.email.clone(),
                    },
                    ttl,
                );

                conn.transaction(|conn| {
                    diesel::insert_into(auth_users::table)
                        .values(&user)
                        .execute(conn)?;
                    diesel::insert_into(auth_sessions::table)
                        .values(&DbAuthSession::from(&session))
                        .execute(conn)
                })
                .map_err(sign_up_error)?;

                Ok(session)
            })
            .await?;

        info!("Registered user {}", session.user.id);
        Ok(self.opened(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = password.to_string();
        let ttl = self.ttl;

        let session = self
            .blocking(move |conn, hasher| {
                let user = auth_users::table
                    .filter(auth_users::email.eq(&email))
                    .first::<DbAuthUser>(conn)
                    .optional()
                    .map_err(db_error)?
                    .ok_or(AuthError::InvalidCredentials)?;

                if !hasher.verify(&password, &user.password_hash)? {
                    debug!("Rejected password for user {}", user.id);
                    return Err(AuthError::InvalidCredentials);
                }

                let session = Session::new(
                    CurrentUser {
                        id: user.id,
                        email: user.email,
                    },
                    ttl,
                );
                diesel::insert_into(auth_sessions::table)
                    .values(&DbAuthSession::from(&session))
                    .execute(conn)
                    .map_err(db_error)?;
                Ok(session)
            })
            .await?;

        Ok(self.opened(session))
    }

    async fn current_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let lookup = token.to_string();
        let found = self
            .blocking(move |conn, _| {
                auth_sessions::table
                    .inner_join(auth_users::table)
                    .filter(auth_sessions::token.eq(&lookup))
                    .filter(auth_sessions::revoked_at.is_null())
                    .select((auth_sessions::all_columns, auth_users::email))
                    .first::<(DbAuthSession, String)>(conn)
                    .optional()
                    .map_err(db_error)
            })
            .await?;

        let Some((row, email)) = found else {
            return Ok(None);
        };
        let session = Session {
            token: row.token,
            user: CurrentUser {
                id: row.user_id,
                email,
            },
            created_at: row.created_at,
            expires_at: row.expires_at,
        };
        if session.is_expired() {
            self.events.emit(SessionEvent::Expired {
                token: token.to_string(),
            });
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let revoke = token.to_string();
        let revoked = self
            .blocking(move |conn, _| {
                diesel::update(
                    auth_sessions::table
                        .filter(auth_sessions::token.eq(&revoke))
                        .filter(auth_sessions::revoked_at.is_null()),
                )
                .set(auth_sessions::revoked_at.eq(Some(Utc::now())))
                .execute(conn)
                .map_err(db_error)
            })
            .await?;

        if revoked > 0 {
            self.events.emit(SessionEvent::SignedOut {
                token: token.to_string(),
            });
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let removed = self
            .blocking(move |conn, _| {
                diesel::delete(
                    auth_sessions::table.filter(
                        auth_sessions::expires_at
                            .le(Utc::now())
                            .or(auth_sessions::revoked_at.is_not_null()),
                    ),
                )
                .returning((auth_sessions::token, auth_sessions::revoked_at))
                .get_results::<(String, Option<DateTime<Utc>>)>(conn)
                .map_err(db_error)
            })
            .await?;

        // Revoked rows already announced themselves on sign-out.
        for (token, revoked_at) in &removed {
            if revoked_at.is_none() {
                self.events.emit(SessionEvent::Expired {
                    token: token.clone(),
                });
            }
        }
        Ok(removed.len())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
