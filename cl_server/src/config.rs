//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use casino_ledger::{DatabaseConfig, LedgerConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6969);

/// Where balances, transactions and wager history are kept
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Process-local stores, lost on restart
    Memory,
    /// PostgreSQL stores
    Postgres(DatabaseConfig),
}

impl StorageConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::Postgres(_) => "postgres",
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backing
    pub storage: StorageConfig,
    /// Ledger retry policy and starting grant
    pub ledger: LedgerConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args), implies postgres
    /// * `force_memory` - Use in-memory storage regardless of the environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        force_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_required("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let storage = if force_memory {
            StorageConfig::Memory
        } else if let Some(url) = database_url_override {
            let mut database = DatabaseConfig::from_env().unwrap_or_default();
            database.database_url = url;
            StorageConfig::Postgres(database)
        } else {
            let kind = std::env::var("LEDGER_STORAGE").unwrap_or_else(|_| "memory".to_string());
            match kind.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageConfig::Memory,
                "postgres" => {
                    let database =
                        DatabaseConfig::from_env().ok_or_else(|| ConfigError::MissingRequired {
                            var: "DATABASE_URL".to_string(),
                            hint: "Required when LEDGER_STORAGE=postgres".to_string(),
                        })?;
                    StorageConfig::Postgres(database)
                }
                other => {
                    return Err(ConfigError::Invalid {
                        var: "LEDGER_STORAGE".to_string(),
                        reason: format!("Expected 'memory' or 'postgres', got '{other}'"),
                    });
                }
            }
        };

        let metrics_bind = parse_env_required("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            storage,
            ledger: LedgerConfig::from_env(),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate().map_err(|e| ConfigError::Invalid {
            var: e.var().to_string(),
            reason: e.to_string(),
        })?;

        if let StorageConfig::Postgres(database) = &self.storage {
            if database.database_url.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL".to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }

            if database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        database.max_connections
                    ),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable, failing if it is set but malformed
fn parse_env_required<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            storage: StorageConfig::Memory,
            ledger: LedgerConfig::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Set it".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Set it"));
    }

    #[test]
    fn test_default_memory_config_is_valid() {
        assert!(memory_config().validate().is_ok());
        assert_eq!(memory_config().storage.name(), "memory");
    }

    #[test]
    fn test_config_validation_zero_cas_attempts() {
        let mut config = memory_config();
        config.ledger.max_cas_attempts = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("LEDGER_MAX_CAS_ATTEMPTS"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = memory_config();
        config.storage = StorageConfig::Postgres(DatabaseConfig {
            database_url: "postgres://localhost/test".to_string(),
            max_connections: 2,
            min_connections: 5, // Invalid: above max
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_config_validation_metrics_port_clash() {
        let mut config = memory_config();
        config.metrics_bind = Some(config.bind);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("METRICS_BIND"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let bind: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        let config = ServerConfig::from_env(
            Some(bind),
            Some("postgres://cli@localhost/ledger".to_string()),
            false,
        )
        .unwrap();

        assert_eq!(config.bind, bind);
        match config.storage {
            StorageConfig::Postgres(db) => {
                assert_eq!(db.database_url, "postgres://cli@localhost/ledger")
            }
            StorageConfig::Memory => panic!("Expected postgres storage"),
        }

        let config = ServerConfig::from_env(Some(bind), None, true).unwrap();
        assert!(matches!(config.storage, StorageConfig::Memory));
    }
}
