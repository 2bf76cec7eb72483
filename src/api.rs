//! The API facade: one method per remote endpoint.

use crate::{ApiConfig, Credentials, HttpResponse, RequestClient, Result, StatusCheck};

/// An interface to the remote API.
///
/// Every endpoint method issues exactly one call through the shared
/// [`RequestClient`] and runs it under a [`StatusCheck`]. To add an endpoint,
/// add one method with one path and one allowed status set.
///
/// # Examples
///
/// ```no_run
/// use digestcall::{Api, ApiConfig};
///
/// # async fn example() -> Result<(), digestcall::Error> {
/// let api = Api::new(ApiConfig::new("api.example.com", "alice", "secret").with_port(8443))?;
///
/// api.check_connection().await?;
///
/// let todos = api.todos().await?;
/// if todos.is_success() {
///     let items: Vec<serde_json::Value> = todos.json()?;
///     println!("{} todos", items.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Api {
    client: RequestClient,
}

impl Api {
    /// Builds the digest credentials and request client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`](crate::Error::ConfigurationError)
    /// for invalid settings. No network call is made.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.timeout();
        let mut builder = RequestClient::builder()
            .host(config.host)
            .scheme(config.scheme)
            .credentials(Credentials::new(config.username, config.password))
            .base_path(config.base_path)
            .accept_invalid_certs(config.accept_invalid_certs);
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder.no_timeout(),
        };

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Builds an `Api` from the `HOST`, `PORT`, `USER` and `PW` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    /// Returns the underlying client, for calls without a dedicated method.
    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    /// Probes the server with a `HEAD` on the base path.
    ///
    /// Any HTTP response, whatever its status, counts as reachable.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the server cannot be reached.
    pub async fn check_connection(&self) -> Result<()> {
        let response = self.client.head("").await?;
        tracing::debug!(
            url = %response.request.url,
            status = response.status_code(),
            "Connection check succeeded"
        );
        Ok(())
    }

    /// Fetches the todos endpoint.
    pub async fn todos(&self) -> Result<HttpResponse> {
        StatusCheck::new(200)
            .call(|| self.client.get("/todos"))
            .await
    }
}
