use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::core::config::{AppConfig, SecurityConfig};
use crate::core::records::{
    BackendError, Filter, ListQuery, MemoryRecordStore, Record, RecordStore, Repository,
};
use crate::core::session::{CurrentUser, MemorySessionProvider, SessionContext};
use crate::core::shared::state::AppState;
use crate::security::PasswordHasher;

pub fn test_config() -> AppConfig {
    AppConfig {
        security: SecurityConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            min_password_length: 8,
        },
        ..AppConfig::default()
    }
}

pub fn test_user() -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        email: "qualite@example.com".to_string(),
    }
}

pub fn memory_sessions(config: &AppConfig) -> Arc<MemorySessionProvider> {
    let hasher = PasswordHasher::new(&config.security).expect("test hasher");
    Arc::new(MemorySessionProvider::new(
        hasher,
        chrono::Duration::hours(config.session.ttl_hours),
    ))
}

/// Must run inside a tokio runtime.
pub fn test_state(store: Arc<dyn RecordStore>) -> Arc<AppState> {
    let config = test_config();
    let sessions = SessionContext::start(memory_sessions(&config));
    Arc::new(AppState::new(config, store, sessions))
}

/// Memory store that counts calls.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryRecordStore,
    lists: AtomicUsize,
    creates: AtomicUsize,
}

impl CountingStore {
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Record> Repository<E> for CountingStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<E>, BackendError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Repository::<E>::list(&self.inner, query).await
    }

    async fn create(&self, row: E::New) -> Result<E, BackendError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Repository::<E>::create(&self.inner, row).await
    }

    async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError> {
        Repository::<E>::count(&self.inner, filters).await
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Every call fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingStore {
    pub error: BackendError,
}

impl FailingStore {
    pub fn new(error: BackendError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl<E: Record> Repository<E> for FailingStore {
    async fn list(&self, _query: &ListQuery) -> Result<Vec<E>, BackendError> {
        Err(self.error.clone())
    }

    async fn create(&self, _row: E::New) -> Result<E, BackendError> {
        Err(self.error.clone())
    }

    async fn count(&self, _filters: &[Filter]) -> Result<i64, BackendError> {
        Err(self.error.clone())
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn health(&self) -> Result<(), BackendError> {
        Err(self.error.clone())
    }
}

/// Lists block until [`GatedStore::open`] is called once per pending list.
#[derive(Debug, Default)]
pub struct GatedStore {
    pub inner: MemoryRecordStore,
    gate: Notify,
    waiting: AtomicUsize,
}

impl GatedStore {
    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Record> Repository<E> for GatedStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<E>, BackendError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        Repository::<E>::list(&self.inner, query).await
    }

    async fn create(&self, row: E::New) -> Result<E, BackendError> {
        Repository::<E>::create(&self.inner, row).await
    }

    async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError> {
        Repository::<E>::count(&self.inner, filters).await
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    fn backend_name(&self) -> &'static str {
        "gated"
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
