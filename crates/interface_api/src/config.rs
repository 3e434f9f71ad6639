//! API configuration

use serde::Deserialize;

use domain_claims::LedgerGatewayConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Claim store backend: "postgres" or "memory"
    pub store_backend: String,
    /// Ledger backend: "rpc" or "memory"
    pub ledger_backend: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/claims".to_string(),
            log_level: "info".to_string(),
            store_backend: "postgres".to_string(),
            ledger_backend: "rpc".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads ledger gateway configuration from `LEDGER_`-prefixed environment
/// variables, falling back to defaults for anything unset
pub fn ledger_config_from_env() -> LedgerGatewayConfig {
    config::Config::builder()
        .add_source(config::Environment::with_prefix("LEDGER"))
        .build()
        .and_then(|c| c.try_deserialize())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_backend, "postgres");
        assert_eq!(config.ledger_backend, "rpc");
    }

    #[test]
    fn test_server_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:9090");
    }
}
