//! HTTP client that fills in the base URL and digest authentication.
//!
//! The [`RequestClient`] type performs one logical call per
//! [`request`](RequestClient::request). Use [`RequestClientBuilder`] to
//! configure and create clients.

use crate::{
    auth::{find_digest_challenge, Credentials},
    response::RequestRecord,
    Error, HttpResponse, RequestOptions, Result,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix placed between the base URL and every endpoint.
pub const DEFAULT_BASE_PATH: &str = "/api";

/// URL scheme used to reach the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// TLS, the default.
    #[default]
    Https,
    /// Plaintext, for endpoints such as local test servers.
    Http,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Https => f.write_str("https"),
            Scheme::Http => f.write_str("http"),
        }
    }
}

/// An HTTP client bound to one API host.
///
/// The base URL and credentials are fixed at construction. No idle
/// connection is kept between calls, and the client is cheap to clone and
/// safe to share across tasks.
///
/// # Examples
///
/// ```no_run
/// use digestcall::{Credentials, RequestClient, RequestOptions};
/// use http::Method;
///
/// # async fn example() -> Result<(), digestcall::Error> {
/// let client = RequestClient::builder()
///     .host("api.example.com")
///     .port(8443)
///     .credentials(Credentials::new("user", "secret"))
///     .build()?;
///
/// assert_eq!(client.base_url(), "https://api.example.com:8443");
///
/// let response = client
///     .request(Method::GET, "/todos", RequestOptions::new())
///     .await?;
/// println!("{} {}", response.status, response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    base_path: String,
    credentials: Option<Credentials>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl RequestClient {
    /// Creates a new `RequestClientBuilder` for configuring a client.
    pub fn builder() -> RequestClientBuilder {
        RequestClientBuilder::new()
    }

    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if `host` is empty or not a bare
    /// host name, or if `base_path` does not start with `/`.
    pub fn new(
        host: impl Into<String>,
        port: Option<u16>,
        credentials: Credentials,
        base_path: impl Into<String>,
    ) -> Result<Self> {
        let mut builder = Self::builder()
            .host(host)
            .credentials(credentials)
            .base_path(base_path);
        if let Some(port) = port {
            builder = builder.port(port);
        }
        builder.build()
    }

    /// Returns the scheme, host and optional port shared by every call.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the path prefix placed in front of every endpoint.
    pub fn base_path(&self) -> &str {
        &self.inner.base_path
    }

    /// Returns the full URL for `endpoint`: base URL, base path, endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result does not parse.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let url = format!(
            "{}{}{}",
            self.inner.base_url, self.inner.base_path, endpoint
        );
        Ok(Url::parse(&url)?)
    }

    /// Performs one call against `endpoint` and returns the raw response.
    ///
    /// If the server answers `401` with a Digest challenge and the client has
    /// credentials, the request is sent once more with an `Authorization`
    /// header. Any status, including a second `401`, is returned as a
    /// response rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] or [`Error::Timeout`] if the server could
    /// not be reached, and [`Error::Authentication`] if the digest challenge
    /// cannot be answered.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let start_time = Instant::now();

        let mut url = self.endpoint_url(endpoint)?;
        if !options.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &options.query_params {
                pairs.append_pair(key, value);
            }
        }

        let body = options.body.to_bytes();

        tracing::debug!(
            method = %method,
            url = %url,
            "Executing HTTP request"
        );

        let mut response = self
            .send(&method, &url, &options, body.as_deref(), None)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(credentials) = &self.inner.credentials {
                if let Some(challenge) = find_digest_challenge(response.headers())? {
                    tracing::debug!(
                        realm = %challenge.realm,
                        algorithm = %challenge.algorithm,
                        "Answering digest challenge"
                    );
                    let authorization = challenge.authorization(
                        credentials,
                        &method,
                        &request_target(&url),
                        body.as_deref().unwrap_or_default(),
                    )?;
                    response = self
                        .send(&method, &url, &options, body.as_deref(), Some(&authorization))
                        .await?;
                }
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        let latency = start_time.elapsed();

        tracing::debug!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        Ok(HttpResponse::new(
            status,
            headers,
            text,
            RequestRecord {
                method,
                url: url.to_string(),
                body: body.map(|b| String::from_utf8_lossy(&b).into_owned()),
            },
            latency,
        ))
    }

    /// Executes a single HTTP exchange.
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        options: &RequestOptions,
        body: Option<&[u8]>,
        authorization: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.inner.http_client.request(method.clone(), url.clone());

        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }

        for (name, value) in &options.headers {
            request = request.header(name, value);
        }

        if let Some(content_type) = options.body.content_type() {
            if !options.headers.contains_key(CONTENT_TYPE) {
                request = request.header(CONTENT_TYPE, content_type);
            }
        }

        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        Ok(request.send().await?)
    }

    /// Makes a GET request to `endpoint`.
    pub async fn get(&self, endpoint: &str) -> Result<HttpResponse> {
        self.request(Method::GET, endpoint, RequestOptions::new())
            .await
    }

    /// Makes a HEAD request to `endpoint`.
    pub async fn head(&self, endpoint: &str) -> Result<HttpResponse> {
        self.request(Method::HEAD, endpoint, RequestOptions::new())
            .await
    }

    /// Makes a DELETE request to `endpoint`.
    pub async fn delete(&self, endpoint: &str) -> Result<HttpResponse> {
        self.request(Method::DELETE, endpoint, RequestOptions::new())
            .await
    }

    /// Makes a POST request to `endpoint`.
    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.request(Method::POST, endpoint, options).await
    }

    /// Makes a PUT request to `endpoint`.
    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.request(Method::PUT, endpoint, options).await
    }

    /// Makes a PATCH request to `endpoint`.
    pub async fn patch(&self, endpoint: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.request(Method::PATCH, endpoint, options).await
    }
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_url", &self.inner.base_url)
            .field("base_path", &self.inner.base_path)
            .field("credentials", &self.inner.credentials)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// Path and query of `url`, as used in the digest `uri` field.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Formats the base URL for `host` and `port` and checks that it parses
/// back to exactly that host and port.
///
/// A host carrying `?`, `#`, `@`, a port or a path would otherwise shift the
/// configured port and base path into another URL component.
pub(crate) fn derive_base_url(scheme: Scheme, host: &str, port: Option<u16>) -> Result<String> {
    if host.trim().is_empty() {
        return Err(Error::ConfigurationError(
            "Host must not be empty".to_string(),
        ));
    }
    let invalid = || {
        Error::ConfigurationError(format!("Host must be a bare host name, got: {}", host))
    };
    if host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let base_url = match port {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    };
    let url = Url::parse(&base_url).map_err(|_| invalid())?;

    let expected_port = match (port, scheme) {
        (Some(port), _) => port,
        (None, Scheme::Https) => 443,
        (None, Scheme::Http) => 80,
    };
    let same_host = url
        .host_str()
        .is_some_and(|parsed| parsed.eq_ignore_ascii_case(host));
    if !same_host
        || url.port_or_known_default() != Some(expected_port)
        || !url.username().is_empty()
        || url.password().is_some()
        || url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
    {
        return Err(invalid());
    }

    Ok(base_url)
}

/// Builder for configuring and creating a [`RequestClient`].
///
/// # Examples
///
/// ```no_run
/// use digestcall::{Credentials, RequestClientBuilder};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), digestcall::Error> {
/// let client = RequestClientBuilder::new()
///     .host("api.example.com")
///     .credentials(Credentials::new("user", "secret"))
///     .base_path("/v2")
///     .timeout(Duration::from_secs(10))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// assert_eq!(client.base_url(), "https://api.example.com");
/// # Ok(())
/// # }
/// ```
pub struct RequestClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    scheme: Scheme,
    credentials: Option<Credentials>,
    base_path: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl RequestClientBuilder {
    /// Creates a new `RequestClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            host: None,
            port: None,
            scheme: Scheme::default(),
            credentials: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            default_headers: HeaderMap::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            accept_invalid_certs: false,
        }
    }

    /// Sets the host name.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port. Without one, the scheme's default port is used.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the URL scheme.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the credentials used to answer digest challenges.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the path prefix placed in front of every endpoint.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Removes the request timeout. Calls may then block indefinitely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Disables TLS certificate verification.
    ///
    /// Off by default. Only meant for servers with self-signed certificates
    /// on trusted networks.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builds the configured `RequestClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is missing or malformed, if the base path
    /// does not start with `/`, or if the HTTP client cannot be created.
    pub fn build(self) -> Result<RequestClient> {
        let host = self
            .host
            .ok_or_else(|| Error::ConfigurationError("Host is required".to_string()))?;
        let base_url = derive_base_url(self.scheme, &host, self.port)?;

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(Error::ConfigurationError(format!(
                "Base path must start with '/', got: {}",
                self.base_path
            )));
        }

        if self.accept_invalid_certs {
            tracing::warn!(
                base_url = %base_url,
                "TLS certificate verification is disabled"
            );
        }

        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(RequestClient {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                base_path: self.base_path,
                credentials: self.credentials,
                default_headers: self.default_headers,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for RequestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
