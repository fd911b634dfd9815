//! Application configuration loaded from environment variables.
//!
//! All configuration is loaded from environment variables with defaults
//! suitable for development. A `.env` file in the working directory is read
//! first if present.
//!
//! # Dataset
//!
//! - `QUOTES_PATH`: JSON file holding the quotes (default: `configs/quotes.json`)
//! - `QUOTES_RELOAD`: re-read the file on every request instead of caching it
//!   at startup (default: `false`)
//!
//! # Rate Limiting
//!
//! - `RATE_LIMIT`: requests per period per client IP (default: 50, 0 disables)
//! - `RATE_LIMIT_PERIOD_SECS`: length of the rate limit period (default: 60)
//! - `RANDOM_RATE_LIMIT`: limit for `/v1/quotes/random` (default: 100)

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for terminals
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "console" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8080)
    pub port: u16,

    /// Deployment environment name (default: "development")
    pub environment: String,

    /// Upper bound for handling a single request (default: 10 seconds)
    pub request_timeout: Duration,

    // =========================================================================
    // Dataset Configuration
    // =========================================================================
    /// Path of the quotes JSON file
    pub quotes_path: PathBuf,

    /// Re-read the dataset on every request instead of caching it at startup
    pub reload_quotes: bool,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Requests allowed per period per client IP (default: 50)
    /// Set to 0 to disable rate limiting
    pub rate_limit: u32,

    /// Length of the rate limit period (default: 60 seconds)
    pub rate_limit_period: Duration,

    /// Requests allowed per period per client IP on the random endpoint (default: 100)
    pub random_rate_limit: u32,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Allowed CORS origins; "*" allows any origin
    pub cors_allowed_origins: Vec<String>,

    /// How long browsers may cache CORS preflight results (default: 300 seconds)
    pub cors_max_age: Duration,

    /// Trusted proxy CIDR ranges.
    ///
    /// When non-empty, `X-Forwarded-For` / `X-Real-IP` are only honored for
    /// connections whose peer address falls inside one of these ranges.
    /// Empty trusts forwarding headers from every peer.
    pub trusted_proxies: Vec<String>,

    /// `Strict-Transport-Security` max age in seconds (0 disables the header)
    pub hsts_max_age: u64,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level filter used when `RUST_LOG` is unset (default: "info")
    pub log_level: String,

    /// Log output format (default: json in production, pretty otherwise)
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a value cannot be parsed or the
    /// resulting configuration is inconsistent.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = env::var("ENVIRONMENT")
            .ok()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "development".to_string());
        let default_format = if environment == "production" {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8080)?,
            environment,
            request_timeout: Duration::from_secs(Self::parse_env("REQUEST_TIMEOUT_SECS", 10)?),

            // Dataset
            quotes_path: env::var("QUOTES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("configs/quotes.json")),
            reload_quotes: Self::parse_env("QUOTES_RELOAD", false)?,

            // Rate limiting
            rate_limit: Self::parse_env("RATE_LIMIT", 50)?,
            rate_limit_period: Duration::from_secs(Self::parse_env("RATE_LIMIT_PERIOD_SECS", 60)?),
            random_rate_limit: Self::parse_env("RANDOM_RATE_LIMIT", 100)?,

            // Security
            cors_allowed_origins: Self::parse_list("CORS_ALLOWED_ORIGINS", "*"),
            cors_max_age: Duration::from_secs(Self::parse_env("CORS_MAX_AGE_SECS", 300)?),
            trusted_proxies: Self::parse_list("TRUSTED_PROXIES", ""),
            hsts_max_age: Self::parse_env("HSTS_MAX_AGE_SECS", 31_536_000)?,

            // Observability
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", default_format)?,
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.request_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.quotes_path.as_os_str().is_empty() {
            return Err(AppError::ConfigError(
                "QUOTES_PATH must not be empty".to_string(),
            ));
        }

        if self.rate_limiting_enabled() {
            if self.rate_limit_period.is_zero() {
                return Err(AppError::ConfigError(
                    "RATE_LIMIT_PERIOD_SECS must be greater than 0".to_string(),
                ));
            }
            if self.random_rate_limit == 0 {
                return Err(AppError::ConfigError(
                    "RANDOM_RATE_LIMIT must be greater than 0 when RATE_LIMIT is set".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit > 0
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match env::var(name) {
            Ok(val) if !val.trim().is_empty() => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            _ => Ok(default),
        }
    }

    /// Parse a comma-separated list, dropping empty entries.
    fn parse_list(name: &str, default: &str) -> Vec<String> {
        split_list(&env::var(name).unwrap_or_else(|_| default.to_string()))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
            request_timeout: Duration::from_secs(10),
            // Dataset
            quotes_path: PathBuf::from("configs/quotes.json"),
            reload_quotes: false,
            // Rate limiting
            rate_limit: 50,
            rate_limit_period: Duration::from_secs(60),
            random_rate_limit: 100,
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            cors_max_age: Duration::from_secs(300),
            trusted_proxies: vec![],
            hsts_max_age: 31_536_000,
            // Observability
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: 9090,
        }
    }
}
