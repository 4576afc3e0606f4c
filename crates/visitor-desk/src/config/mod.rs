use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the visitor desk.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
}

const MAX_PAGE_SIZE: usize = 200;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let poll_interval_secs = positive_var("VISITOR_POLL_INTERVAL_SECS", 15)
            .ok_or(ConfigError::InvalidPollInterval)?;
        let store_timeout_ms = positive_var("VISITOR_STORE_TIMEOUT_MS", 2_000)
            .ok_or(ConfigError::InvalidStoreTimeout)?;
        let default_page_size = positive_var("VISITOR_PAGE_SIZE", 10)
            .filter(|size| *size <= MAX_PAGE_SIZE as u64)
            .ok_or(ConfigError::InvalidPageSize)? as usize;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowConfig {
                poll_interval: Duration::from_secs(poll_interval_secs),
                store_timeout: Duration::from_millis(store_timeout_ms),
                default_page_size,
            },
        })
    }
}

/// Reads a strictly positive integer, falling back to `default` when unset.
fn positive_var(key: &str, default: u64) -> Option<u64> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().ok().filter(|value| *value > 0),
        Err(_) => Some(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Polling cadence and store call bounds for the workflow engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub poll_interval: Duration,
    pub store_timeout: Duration,
    pub default_page_size: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            store_timeout: Duration::from_millis(2_000),
            default_page_size: 10,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPollInterval,
    InvalidStoreTimeout,
    InvalidPageSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPollInterval => {
                write!(f, "VISITOR_POLL_INTERVAL_SECS must be a positive integer")
            }
            ConfigError::InvalidStoreTimeout => {
                write!(f, "VISITOR_STORE_TIMEOUT_MS must be a positive integer")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "VISITOR_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPollInterval
            | ConfigError::InvalidStoreTimeout
            | ConfigError::InvalidPageSize => None,
        }
    }
}
