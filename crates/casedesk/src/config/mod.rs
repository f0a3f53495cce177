use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::cases::view::DEFAULT_PAGE_SIZE;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub api: ApiConfig,
    pub views: ViewConfig,
}

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

        let base_url = non_empty_var("CASEDESK_API_URL");
        let token = non_empty_var("CASEDESK_API_TOKEN");
        let auth_retries = parse_var("CASEDESK_AUTH_RETRIES", DEFAULT_AUTH_RETRIES)?;
        let retry_delay_ms = parse_var("CASEDESK_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?;
        let request_timeout = match non_empty_var("CASEDESK_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidNumber {
                    variable: "CASEDESK_REQUEST_TIMEOUT_SECS",
                }
            })?)),
            None => None,
        };

        let page_size = parse_var("CASEDESK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidNumber {
                variable: "CASEDESK_PAGE_SIZE",
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            api: ApiConfig {
                base_url,
                token,
                auth_retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
                request_timeout,
            },
            views: ViewConfig { page_size },
        })
    }
}

const DEFAULT_AUTH_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable: name }),
        None => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Upstream case API connection settings.
///
/// When `base_url` is unset the service falls back to the seeded in-memory backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Extra attempts for the collection fetch after an HTTP 401.
    pub auth_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            auth_retries: DEFAULT_AUTH_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub page_size: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CASEDESK_API_URL",
            "CASEDESK_API_TOKEN",
            "CASEDESK_AUTH_RETRIES",
            "CASEDESK_RETRY_DELAY_MS",
            "CASEDESK_REQUEST_TIMEOUT_SECS",
            "CASEDESK_PAGE_SIZE",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.api.base_url.is_none());
        assert_eq!(config.api.auth_retries, 2);
        assert_eq!(config.api.retry_delay, Duration::from_secs(1));
        assert!(config.api.request_timeout.is_none());
        assert_eq!(config.views.page_size, 10);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_upstream_api_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CASEDESK_API_URL", "https://cases.internal");
        env::set_var("CASEDESK_AUTH_RETRIES", "0");
        env::set_var("CASEDESK_RETRY_DELAY_MS", "250");
        env::set_var("CASEDESK_REQUEST_TIMEOUT_SECS", "15");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.api.base_url.as_deref(), Some("https://cases.internal"));
        assert_eq!(config.api.auth_retries, 0);
        assert_eq!(config.api.retry_delay, Duration::from_millis(250));
        assert_eq!(config.api.request_timeout, Some(Duration::from_secs(15)));
        reset_env();
    }

    #[test]
    fn rejects_zero_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CASEDESK_PAGE_SIZE", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { variable }) => {
                assert_eq!(variable, "CASEDESK_PAGE_SIZE")
            }
            other => panic!("expected invalid page size, got {other:?}"),
        }
        reset_env();
    }
}
