//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ENQUIRY_API_URL` - Backend REST API base URL (default: `http://localhost:5000`)
//! - `ENQUIRY_API_TIMEOUT_SECS` - Per-request timeout for backend calls (default: none)
//! - `CONSOLE_HOST` - Bind address (default: 127.0.0.1)
//! - `CONSOLE_PORT` - Listen port (default: 3000)
//! - `CONSOLE_BASE_URL` - Public URL of the console (default: `http://localhost:3000`)
//! - `CONSOLE_STATIC_DIR` - Directory served under `/static` (default: `crates/console/static`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sampling (default: 1.0)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Optional (TLS)
//! - `CONSOLE_TLS_CERT` - PEM-encoded certificate chain
//! - `CONSOLE_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_STATIC_DIR: &str = "crates/console/static";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub static_dir: PathBuf,
    pub api: ApiConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    pub json_logs: bool,
    pub tls: Option<TlsConfig>,
}

/// Where and how to reach the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    /// Backend at `base_url` with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not absolute http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_api_url(base_url)?,
            timeout: None,
        })
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_api_url(&get_env_or_default(
            lookup,
            "ENQUIRY_API_URL",
            DEFAULT_API_URL,
        ))?;
        let timeout = get_optional_env(lookup, "ENQUIRY_API_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("ENQUIRY_API_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;
        Ok(Self { base_url, timeout })
    }
}

#[derive(Clone)]
pub struct TlsConfig {
    pub cert_pem: String,
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env(lookup, "CONSOLE_TLS_CERT");
        let key_pem = get_optional_env(lookup, "CONSOLE_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CONSOLE_TLS_*".to_string(),
                "Both CONSOLE_TLS_CERT and CONSOLE_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from the process environment (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(&lookup, "CONSOLE_HOST", DEFAULT_HOST)
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONSOLE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(&lookup, "CONSOLE_PORT", DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONSOLE_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default(&lookup, "CONSOLE_BASE_URL", DEFAULT_BASE_URL);
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CONSOLE_BASE_URL".to_string(), e.to_string())
        })?;
        let static_dir =
            PathBuf::from(get_env_or_default(&lookup, "CONSOLE_STATIC_DIR", DEFAULT_STATIC_DIR));

        let api = ApiConfig::from_lookup(&lookup)?;
        let sentry_dsn = get_optional_env(&lookup, "SENTRY_DSN");
        let sentry_environment = get_optional_env(&lookup, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(&lookup, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(&lookup, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let json_logs = get_optional_env(&lookup, "LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));
        let tls = TlsConfig::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            api,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            json_logs,
            tls,
        })
    }

    /// Configuration for tests and local tooling: loopback, ephemeral port,
    /// backend at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute http(s) URL.
    pub fn for_backend(api_url: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|_| None)?;
        config.port = 0;
        config.api = ApiConfig::new(api_url)?;
        Ok(config)
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("ENQUIRY_API_URL".to_string(), reason);
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid("must be an absolute URL".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url.as_str(), "http://localhost:5000/");
        assert!(config.api.timeout.is_none());
        assert!(!config.secure_cookies());
        assert!(!config.json_logs);
        assert!(config.tls.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("ENQUIRY_API_URL", "https://api.example.com"),
            ("ENQUIRY_API_TIMEOUT_SECS", "15"),
            ("CONSOLE_PORT", "8080"),
            ("CONSOLE_BASE_URL", "https://desk.example.com"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url.host_str(), Some("api.example.com"));
        assert_eq!(config.api.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.port, 8080);
        assert!(config.secure_cookies());
        assert!(config.json_logs);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for vars in [
            [("CONSOLE_PORT", "eighty")],
            [("CONSOLE_HOST", "localhost")],
            [("ENQUIRY_API_URL", "ftp://api.example.com")],
            [("ENQUIRY_API_URL", "not a url")],
            [("ENQUIRY_API_TIMEOUT_SECS", "-1")],
        ] {
            let err = ConsoleConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(..)), "{vars:?}");
        }
    }

    #[test]
    fn test_tls_requires_both_halves() {
        let err = ConsoleConfig::from_lookup(lookup(&[("CONSOLE_TLS_CERT", "cert")])).unwrap_err();
        assert!(err.to_string().contains("CONSOLE_TLS_*"));

        let config = ConsoleConfig::from_lookup(lookup(&[
            ("CONSOLE_TLS_CERT", "cert"),
            ("CONSOLE_TLS_KEY", "very-private-key"),
        ]))
        .unwrap();
        let debug_output = format!("{:?}", config.tls.unwrap());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-private-key"));
    }

    #[test]
    fn test_for_backend_uses_ephemeral_port() {
        let config = ConsoleConfig::for_backend("http://127.0.0.1:4010").unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.api.base_url.port(), Some(4010));
    }
}
