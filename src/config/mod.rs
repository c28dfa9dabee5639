use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::types::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub linking: LinkingConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkingConfig {
    /// Identifier of the tenant that holds citizens awaiting resolution
    pub fallback_tenant_id: TenantId,
    /// Attempts per ownership write when the store reports a transient error
    pub write_retry_attempts: u32,
    pub write_retry_backoff_ms: u64,
    pub max_concurrent_writes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Fallback pool id used when LINK_FALLBACK_TENANT_ID is not set
pub const DEFAULT_FALLBACK_TENANT_ID: Uuid = Uuid::nil();

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            fallback_tenant_id: TenantId(DEFAULT_FALLBACK_TENANT_ID),
            write_retry_attempts: 3,
            write_retry_backoff_ms: 50,
            max_concurrent_writes: 4,
        }
    }
}

impl LinkingConfig {
    pub fn with_fallback(fallback_tenant_id: TenantId) -> Self {
        Self {
            fallback_tenant_id,
            ..Self::default()
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Linking overrides
        if let Ok(v) = env::var("LINK_FALLBACK_TENANT_ID") {
            match v.parse() {
                Ok(id) => self.linking.fallback_tenant_id = id,
                Err(_) => tracing::warn!("Ignoring invalid LINK_FALLBACK_TENANT_ID: {}", v),
            }
        }
        if let Ok(v) = env::var("LINK_WRITE_RETRY_ATTEMPTS") {
            self.linking.write_retry_attempts = v.parse().unwrap_or(self.linking.write_retry_attempts);
        }
        if let Ok(v) = env::var("LINK_WRITE_RETRY_BACKOFF_MS") {
            self.linking.write_retry_backoff_ms = v.parse().unwrap_or(self.linking.write_retry_backoff_ms);
        }
        if let Ok(v) = env::var("LINK_MAX_CONCURRENT_WRITES") {
            self.linking.max_concurrent_writes = v.parse().unwrap_or(self.linking.max_concurrent_writes);
        }

        // API overrides
        if let Some(port) = env::var("LINK_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            linking: LinkingConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            linking: LinkingConfig {
                write_retry_attempts: 3,
                write_retry_backoff_ms: 100,
                max_concurrent_writes: 8,
                ..LinkingConfig::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            linking: LinkingConfig {
                write_retry_attempts: 5,
                write_retry_backoff_ms: 200,
                max_concurrent_writes: 16,
                ..LinkingConfig::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
        }
    }
}

// Global singleton config for the binaries; library components take explicit config
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.linking.fallback_tenant_id, TenantId(Uuid::nil()));
        assert_eq!(config.linking.write_retry_attempts, 3);
        assert!(config.api.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.linking.max_concurrent_writes, 16);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn test_env_overrides_fallback_pool() {
        let id = Uuid::new_v4();
        env::set_var("LINK_FALLBACK_TENANT_ID", id.to_string());
        env::set_var("LINK_WRITE_RETRY_ATTEMPTS", "7");
        let config = AppConfig::development().with_env_overrides();
        env::remove_var("LINK_FALLBACK_TENANT_ID");
        env::remove_var("LINK_WRITE_RETRY_ATTEMPTS");

        assert_eq!(config.linking.fallback_tenant_id, TenantId(id));
        assert_eq!(config.linking.write_retry_attempts, 7);
    }
}
