//! Connection settings for an [`Api`](crate::Api).
//!
//! Settings are an explicit value passed to [`Api::new`](crate::Api::new).
//! They can be built in code, read from a TOML file, or taken from the
//! `HOST`, `PORT`, `USER` and `PW` environment variables.

use crate::client::{derive_base_url, Scheme, DEFAULT_BASE_PATH, DEFAULT_TIMEOUT};
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Settings consumed once when an [`Api`](crate::Api) is constructed.
///
/// # Examples
///
/// ```
/// use digestcall::ApiConfig;
///
/// let config = ApiConfig::from_toml_str(r#"
///     host = "api.example.com"
///     port = 8443
///     user = "alice"
///     pw = "secret"
/// "#).unwrap();
///
/// assert_eq!(config.port, Some(8443));
/// assert_eq!(config.base_path, "/api");
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Host name of the API server, without scheme or path.
    pub host: String,

    /// Port; the scheme's default when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Digest username.
    #[serde(alias = "user")]
    pub username: String,

    /// Digest password.
    #[serde(alias = "pw")]
    pub password: String,

    /// Path prefix placed in front of every endpoint.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default)]
    pub scheme: Scheme,

    /// Disables TLS certificate verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout in seconds; `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Creates settings with default port, base path, scheme and timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            base_path: default_base_path(),
            scheme: Scheme::default(),
            accept_invalid_certs: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Returns the per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Parses settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for malformed TOML, unknown keys
    /// or missing required keys.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| Error::ConfigurationError(format!("Invalid configuration: {}", e)))
    }

    /// Reads settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Reads settings from the process environment.
    ///
    /// `HOST`, `USER` and `PW` are required; `PORT`, `BASE_PATH`, `SCHEME`,
    /// `TIMEOUT_SECS` and `ACCEPT_INVALID_CERTS` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                Error::ConfigurationError(format!("Missing required setting {}", key))
            })
        };

        let mut config = Self::new(required("HOST")?, required("USER")?, required("PW")?);

        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            config.port = Some(port.parse().map_err(|_| {
                Error::ConfigurationError(format!("PORT must be a number in 1..=65535, got: {}", port))
            })?);
        }
        if let Some(base_path) = lookup("BASE_PATH") {
            config.base_path = base_path;
        }
        if let Some(scheme) = lookup("SCHEME") {
            config.scheme = match scheme.to_ascii_lowercase().as_str() {
                "https" => Scheme::Https,
                "http" => Scheme::Http,
                _ => {
                    return Err(Error::ConfigurationError(format!(
                        "SCHEME must be http or https, got: {}",
                        scheme
                    )))
                }
            };
        }
        if let Some(timeout) = lookup("TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                Error::ConfigurationError(format!("TIMEOUT_SECS must be a number, got: {}", timeout))
            })?;
        }
        if let Some(flag) = lookup("ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = parse_flag(&flag)?;
        }

        Ok(config)
    }

    /// Checks the settings without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for an empty host, a host that
    /// carries a port, path, query, fragment or userinfo, an empty username,
    /// port `0`, or a base path not starting with `/`.
    pub fn validate(&self) -> Result<()> {
        derive_base_url(self.scheme, &self.host, self.port)?;
        if self.username.is_empty() {
            return Err(Error::ConfigurationError(
                "Username must not be empty".to_string(),
            ));
        }
        if self.port == Some(0) {
            return Err(Error::ConfigurationError("Port must not be 0".to_string()));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(Error::ConfigurationError(format!(
                "Base path must start with '/', got: {}",
                self.base_path
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_path", &self.base_path)
            .field("scheme", &self.scheme)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::ConfigurationError(format!(
            "Expected a boolean flag, got: {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::new("api.example.com", "alice", "secret");
        assert_eq!(config.port, None);
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.scheme, Scheme::Https);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_full_keys() {
        let config = ApiConfig::from_toml_str(
            r#"
            host = "localhost"
            port = 8080
            username = "bob"
            password = "pw"
            base_path = "/v1"
            scheme = "http"
            accept_invalid_certs = true
            timeout_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.username, "bob");
        assert_eq!(config.base_path, "/v1");
        assert_eq!(config.scheme, Scheme::Http);
        assert!(config.accept_invalid_certs);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_toml_missing_host() {
        let result = ApiConfig::from_toml_str(r#"user = "a""#);
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_toml_unknown_key() {
        let result = ApiConfig::from_toml_str(
            r#"
            host = "h"
            user = "a"
            pw = "b"
            verify = false
            "#,
        );
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(&path, "host = \"h.example\"\nuser = \"a\"\npw = \"b\"\n").unwrap();

        let config = ApiConfig::from_file(&path).unwrap();
        assert_eq!(config.host, "h.example");

        let missing = ApiConfig::from_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }

    #[test]
    fn test_lookup_required_and_optional() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("HOST", "api.example.com"),
            ("PORT", "8443"),
            ("USER", "alice"),
            ("PW", "secret"),
            ("ACCEPT_INVALID_CERTS", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.host, "api.example.com");
        assert_eq!(config.port, Some(8443));
        assert!(config.accept_invalid_certs);

        let result = ApiConfig::from_lookup(lookup(&[("HOST", "h"), ("USER", "a")]));
        match result {
            Err(Error::ConfigurationError(msg)) => assert!(msg.contains("PW")),
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_bad_port() {
        let result = ApiConfig::from_lookup(lookup(&[
            ("HOST", "h"),
            ("USER", "a"),
            ("PW", "b"),
            ("PORT", "http"),
        ]));
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ApiConfig::new("", "a", "b").validate().is_err());
        assert!(ApiConfig::new("h", "", "b").validate().is_err());
        assert!(ApiConfig::new("h", "a", "b").with_port(0).validate().is_err());
        assert!(ApiConfig::new("h", "a", "b")
            .with_base_path("api")
            .validate()
            .is_err());
        assert!(ApiConfig::new("h", "a", "").validate().is_ok());
        assert!(ApiConfig::new("h?x", "a", "b").validate().is_err());
        assert!(ApiConfig::new("a@b", "a", "b").with_port(8443).validate().is_err());
        assert!(ApiConfig::new("[::1]", "a", "b").with_port(8443).validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", ApiConfig::new("h", "a", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
