//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::payments::providers::PaystackConfig;
use crate::recharge::provider::{parse_provider_order, ProviderName};
use crate::recharge::providers::{
    FlutterwaveConfig, HustleSimConfig, PaystackBillsConfig, ReloadlyConfig, TopupMamaConfig,
    VtPassConfig,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub recharge: RechargePolicy,
    pub providers: ProvidersConfig,
    pub payments: PaystackConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `pay4me_backend=debug,tower_http=info`
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Business rules for recharges
#[derive(Debug, Clone)]
pub struct RechargePolicy {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Per provider call
    pub provider_timeout: Duration,
    /// Retries inside one provider call. Zero keeps one attempt per provider.
    pub provider_max_retries: u32,
    /// Whole failover run; no new provider is tried once it has passed
    pub request_deadline: Option<Duration>,
    pub provider_order: Vec<ProviderName>,
}

/// Credentials and endpoints for every recharge provider. Missing credentials
/// only mean the provider is skipped.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub hustlesim: HustleSimConfig,
    pub topupmama: TopupMamaConfig,
    pub reloadly: ReloadlyConfig,
    pub vtpass: VtPassConfig,
    pub flutterwave: FlutterwaveConfig,
    pub paystack: PaystackBillsConfig,
}

/// Where transactions are kept
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres(String),
    Redis(String),
    Memory,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        let config = AppConfig {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            recharge: RechargePolicy::from_env()?,
            providers: ProvidersConfig::from_env(),
            payments: PaystackConfig::from_env(),
            storage: StorageConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.recharge.validate()?;
        self.storage.validate()?;

        Ok(())
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: var("HOST")
                .or_else(|| var("SERVER_HOST"))
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: match var("PORT").or_else(|| var("SERVER_PORT")) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                None => 8000,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT cannot be 0".to_string()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("HOST cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: var("RUST_LOG")
                .or_else(|| var("LOG_LEVEL"))
                .unwrap_or_else(|| "info".to_string()),
            format: match var("LOG_FORMAT")
                .unwrap_or_else(|| "plain".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                "plain" | "pretty" | "text" => LogFormat::Plain,
                _ => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue("RUST_LOG".to_string()));
        }

        Ok(())
    }
}

impl Default for RechargePolicy {
    fn default() -> Self {
        Self {
            min_amount: Decimal::from(50),
            max_amount: Decimal::from(50_000),
            provider_timeout: Duration::from_secs(10),
            provider_max_retries: 0,
            request_deadline: None,
            provider_order: ProviderName::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl RechargePolicy {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RechargePolicy::default();

        let provider_order = match var("RECHARGE_PROVIDER_ORDER") {
            Some(raw) => parse_provider_order(&raw).map_err(|e| {
                ConfigError::InvalidValue(format!("RECHARGE_PROVIDER_ORDER: {}", e))
            })?,
            None => defaults.provider_order,
        };

        let request_deadline = match var("RECHARGE_DEADLINE_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::InvalidValue("RECHARGE_DEADLINE_SECS".to_string())
            })?)),
            None => None,
        };

        Ok(RechargePolicy {
            min_amount: parse_var("RECHARGE_MIN_AMOUNT", defaults.min_amount)?,
            max_amount: parse_var("RECHARGE_MAX_AMOUNT", defaults.max_amount)?,
            provider_timeout: Duration::from_secs(parse_var(
                "RECHARGE_PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
            provider_max_retries: parse_var(
                "RECHARGE_PROVIDER_MAX_RETRIES",
                defaults.provider_max_retries,
            )?,
            request_deadline,
            provider_order,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_amount <= Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "RECHARGE_MIN_AMOUNT must be positive".to_string(),
            ));
        }

        if self.min_amount > self.max_amount {
            return Err(ConfigError::ValidationFailed(
                "RECHARGE_MIN_AMOUNT must be <= RECHARGE_MAX_AMOUNT".to_string(),
            ));
        }

        if self.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "RECHARGE_PROVIDER_TIMEOUT_SECS cannot be 0".to_string(),
            ));
        }

        if self.provider_order.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "RECHARGE_PROVIDER_ORDER names no providers".to_string(),
            ));
        }

        Ok(())
    }
}

impl ProvidersConfig {
    pub fn from_env() -> Self {
        Self {
            hustlesim: HustleSimConfig::from_env(),
            topupmama: TopupMamaConfig::from_env(),
            reloadly: ReloadlyConfig::from_env(),
            vtpass: VtPassConfig::from_env(),
            flutterwave: FlutterwaveConfig::from_env(),
            paystack: PaystackBillsConfig::from_env(),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL"),
        }
    }

    /// Postgres wins over Redis; with neither, transactions live in memory.
    pub fn backend(&self) -> StorageBackend {
        match (&self.database_url, &self.redis_url) {
            (Some(url), _) => StorageBackend::Postgres(url.clone()),
            (None, Some(url)) => StorageBackend::Redis(url.clone()),
            (None, None) => StorageBackend::Memory,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::InvalidValue(
                    "REDIS_URL must start with redis:// or rediss://".to_string(),
                ));
            }
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::InvalidValue(
                    "DATABASE_URL must be a postgres:// URL".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };

        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_invalid_port_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_recharge_policy() {
        let policy = RechargePolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.min_amount, Decimal::from(50));
        assert_eq!(policy.max_amount, Decimal::from(50_000));
        assert_eq!(policy.provider_timeout, Duration::from_secs(10));
        assert_eq!(policy.provider_order.len(), 6);
        assert_eq!(policy.provider_order[0], ProviderName::HustleSim);
    }

    #[test]
    fn test_inverted_amount_bounds_rejected() {
        let policy = RechargePolicy {
            min_amount: Decimal::from(1000),
            max_amount: Decimal::from(100),
            ..RechargePolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_empty_provider_order_rejected() {
        let policy = RechargePolicy {
            provider_order: vec![],
            ..RechargePolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_storage_backend_selection() {
        let both = StorageConfig {
            database_url: Some("postgres://localhost/pay4me".to_string()),
            redis_url: Some("redis://localhost".to_string()),
        };
        assert!(matches!(both.backend(), StorageBackend::Postgres(_)));

        let redis = StorageConfig {
            database_url: None,
            redis_url: Some("redis://localhost".to_string()),
        };
        assert_eq!(
            redis.backend(),
            StorageBackend::Redis("redis://localhost".to_string())
        );

        assert_eq!(StorageConfig::default().backend(), StorageBackend::Memory);
    }

    #[test]
    fn test_bad_redis_url_rejected() {
        let storage = StorageConfig {
            database_url: None,
            redis_url: Some("http://localhost".to_string()),
        };
        assert!(storage.validate().is_err());
    }
}
