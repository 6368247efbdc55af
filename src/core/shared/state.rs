use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::records::RecordStore;
use crate::core::session::SessionContext;

/// Shared by every handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<SessionContext>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>, sessions: Arc<SessionContext>) -> Self {
        Self {
            config,
            store,
            sessions,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.session.cookie_name
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
