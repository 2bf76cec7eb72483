//! Error types for API calls.
//!
//! Transport and configuration problems are always surfaced as an [`Error`].
//! A response whose status falls outside an endpoint's allowed set is *not* an
//! error by default: it is logged by [`StatusCheck`](crate::StatusCheck) and
//! handed back to the caller. Only [`StatusCheck::enforce`](crate::StatusCheck::enforce)
//! turns it into [`Error::StatusMismatch`].

use http::{Method, StatusCode};

/// The main error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use digestcall::{Api, ApiConfig, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let api = Api::new(ApiConfig::new("api.example.com", "user", "secret"))?;
///
/// match api.todos().await {
///     Ok(response) if response.is_success() => println!("{}", response.text()),
///     Ok(response) => eprintln!("server answered {}", response.status),
///     Err(Error::Timeout) => eprintln!("server did not answer in time"),
///     Err(e) if e.is_transport() => eprintln!("could not reach server: {}", e),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level failure: connection refused, DNS lookup failed, TLS
    /// handshake rejected, and so on.
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Invalid configuration was provided, such as an empty host or missing
    /// credentials. Always raised before any network call.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server sent a digest challenge that could not be answered.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The response status was outside the allowed set.
    ///
    /// Only produced by [`StatusCheck::enforce`](crate::StatusCheck::enforce).
    #[error("Unexpected status {status} for {method} {url} (allowed: {allowed:?})")]
    StatusMismatch {
        /// The status the server returned
        status: StatusCode,
        /// The codes the endpoint accepts
        allowed: Vec<u16>,
        /// Method of the outgoing request
        method: Method,
        /// URL of the outgoing request
        url: String,
        /// The raw response body
        body: String,
    },

    /// The response body could not be deserialized into the requested type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    Deserialization {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body that failed to deserialize
        raw_body: String,
        /// The serde error message
        serde_error: String,
    },

    /// Failed to serialize a JSON request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(err)
        }
    }
}

impl Error {
    /// Returns `true` if the call failed below the HTTP layer (network,
    /// TLS or timeout).
    ///
    /// ```
    /// use digestcall::Error;
    ///
    /// assert!(Error::Timeout.is_transport());
    /// assert!(!Error::ConfigurationError("empty host".into()).is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }

    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::StatusMismatch { status, .. } => Some(*status),
            Error::Deserialization { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::StatusMismatch { body, .. } => Some(body),
            Error::Deserialization { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;
