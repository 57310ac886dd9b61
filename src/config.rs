//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use crate::cache::CacheConfig as StoreConfig;
use std::env;
use std::time::Duration;

pub const DEFAULT_VERSELL_BASE_URL: &str = "https://api.versellpay.com/api/v1/gateway";
pub const DEFAULT_STATUS_TTL_SECS: u64 = 60 * 60 * 6;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub versell: VersellConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used to build the webhook callback URL
    pub public_base_url: Option<String>,
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` selects the in-process store
    pub redis_url: Option<String>,
    pub status_ttl: u64, // seconds
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Versell provider configuration
///
/// Credentials are optional here on purpose: the process still starts without
/// them, and every handler that talks to the provider fails with a
/// configuration error instead.
#[derive(Clone)]
pub struct VersellConfig {
    pub vspi: Option<String>,
    pub vsps: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// The two static header values the provider requires
#[derive(Clone)]
pub struct VersellCredentials {
    pub vspi: String,
    pub vsps: String,
}

impl std::fmt::Debug for VersellConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersellConfig")
            .field("vspi", &self.vspi.as_ref().map(|_| "***"))
            .field("vsps", &self.vsps.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            versell: VersellConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;
        self.versell.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
            public_base_url: non_empty_var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT cannot be 0".to_string()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("HOST cannot be empty".to_string()));
        }

        if let Some(url) = &self.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(
                    "PUBLIC_BASE_URL must be a valid URL".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(CacheConfig {
            redis_url: non_empty_var("REDIS_URL"),
            status_ttl: env::var("STATUS_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_STATUS_TTL_SECS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STATUS_TTL_SECS".to_string()))?,
            max_connections: env::var("CACHE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CACHE_MAX_CONNECTIONS".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::InvalidValue(
                    "REDIS_URL must start with redis:// or rediss://".to_string(),
                ));
            }
        }

        if self.status_ttl == 0 {
            return Err(ConfigError::InvalidValue(
                "STATUS_TTL_SECS must be positive".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "CACHE_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.status_ttl)
    }

    /// Redis pool settings, `None` when no managed store is configured
    pub fn store_config(&self) -> Option<StoreConfig> {
        self.redis_url.as_ref().map(|url| StoreConfig {
            redis_url: url.clone(),
            max_connections: self.max_connections,
            ..Default::default()
        })
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl VersellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(VersellConfig {
            vspi: non_empty_var("VSPI"),
            vsps: non_empty_var("VSPS"),
            base_url: env::var("VERSELL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_VERSELL_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: env::var("VERSELL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VERSELL_TIMEOUT_SECS".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "VERSELL_BASE_URL must be a valid URL".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "VERSELL_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(())
    }

    /// Both credentials, or the names of the missing variables.
    pub fn credentials(&self) -> Result<VersellCredentials, ConfigError> {
        match (&self.vspi, &self.vsps) {
            (Some(vspi), Some(vsps)) => Ok(VersellCredentials {
                vspi: vspi.clone(),
                vsps: vsps.clone(),
            }),
            (None, Some(_)) => Err(ConfigError::MissingVariable("VSPI".to_string())),
            (Some(_), None) => Err(ConfigError::MissingVariable("VSPS".to_string())),
            (None, None) => Err(ConfigError::MissingVariable("VSPI/VSPS".to_string())),
        }
    }
}

impl Default for VersellConfig {
    fn default() -> Self {
        Self {
            vspi: None,
            vsps: None,
            base_url: DEFAULT_VERSELL_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for crate::error::AppError {
    fn from(err: ConfigError) -> Self {
        crate::error::AppError::configuration(err.to_string())
    }
}
