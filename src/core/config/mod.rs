//! Layered application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `qms.toml` (or the file
//! named by `QMS_CONFIG`), the `SERVER_HOST` / `SERVER_PORT` / `DATABASE_URL`
//! variables, then `QMS_`-prefixed variables with `__` as the section separator
//! (`QMS_SESSION__TTL_HOURS=8`).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "qms.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Without a URL the server runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    pub cookie_secure: bool,
    /// How often ended sessions are purged.
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "qms_session".to_string(),
            ttl_hours: 24,
            cookie_secure: false,
            sweep_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, figment::Error> {
        let path = std::env::var("QMS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::figment(Path::new(&path)).extract()
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(
                Env::raw()
                    .only(&["SERVER_HOST", "SERVER_PORT", "DATABASE_URL"])
                    .map(|key| match key.as_str() {
                        "SERVER_HOST" => "server.host".into(),
                        "SERVER_PORT" => "server.port".into(),
                        _ => "database.url".into(),
                    }),
            )
            .merge(Env::prefixed("QMS_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn uses_database(&self) -> bool {
        self.database
            .url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.cookie_name, "qms_session");
        assert_eq!(config.session.sweep_interval(), std::time::Duration::from_secs(300));
        assert!(!config.uses_database());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[session]\nttl_hours = 2\n\n[database]\nurl = \"postgres://qms@localhost/qms\""
        )
        .unwrap();

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.session.ttl_hours, 2);
        assert!(config.uses_database());
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        let mut config = AppConfig::default();
        config.database.url = Some("  ".to_string());
        assert!(!config.uses_database());
    }
}
