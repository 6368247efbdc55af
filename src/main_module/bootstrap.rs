//! Builds the shared state from configuration.

use anyhow::Context;
use chrono::Duration;
use log::{info, warn};
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::records::{MemoryRecordStore, PgRecordStore, RecordStore};
use crate::core::session::{DbSessionProvider, MemorySessionProvider, SessionContext, SessionProvider};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{create_conn, redact_database_url, run_migrations};
use crate::security::PasswordHasher;

/// Connects to PostgreSQL when a URL is configured, otherwise falls back to
/// process-local storage. Must be called from within a tokio runtime.
pub async fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let hasher = PasswordHasher::new(&config.security).context("Invalid password hashing settings")?;
    let ttl = Duration::hours(config.session.ttl_hours);

    let (store, provider): (Arc<dyn RecordStore>, Arc<dyn SessionProvider>) =
        match config.database.url.as_deref().filter(|_| config.uses_database()) {
            Some(url) => {
                info!("Connecting to database at {}", redact_database_url(url));
                let db_config = config.database.clone();
                let url = url.to_string();
                let pool = tokio::task::spawn_blocking(move || create_conn(&db_config, &url))
                    .await
                    .context("Database connection task failed")?
                    .context("Failed to create database pool")?;

                if config.database.run_migrations {
                    let migration_pool = pool.clone();
                    tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
                        .await
                        .context("Migration task failed")?
                        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
                    info!("Database migrations applied");
                }

                (
                    Arc::new(PgRecordStore::new(pool.clone())),
                    Arc::new(DbSessionProvider::new(pool, hasher, ttl)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, records and accounts are kept in memory only");
                (
                    Arc::new(MemoryRecordStore::new()),
                    Arc::new(MemorySessionProvider::new(hasher, ttl)),
                )
            }
        };

    let sessions = SessionContext::start_with_sweep(provider, config.session.sweep_interval());
    info!("Record store backend: {}", store.backend_name());
    Ok(Arc::new(AppState::new(config, store, sessions)))
}
