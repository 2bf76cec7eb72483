//! # digestcall - a thin digest-authenticated API client
//!
//! digestcall wraps `reqwest` with the three things a small internal API
//! integration needs: a base URL derived from host and port, HTTP Digest
//! authentication, and uniform status-code logging around every endpoint.
//!
//! ## Quick Start
//!
//! ```no_run
//! use digestcall::{Api, ApiConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), digestcall::Error> {
//!     // host, user, password; port and base path are optional
//!     let api = Api::new(ApiConfig::new("api.example.com", "alice", "secret"))?;
//!
//!     // GET https://api.example.com/api/todos
//!     let response = api.todos().await?;
//!     println!("{}: {}", response.status, response.text());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Status checks
//!
//! Endpoint methods never fail because of the status code. A
//! [`StatusCheck`] logs an info line for every call and error lines with the
//! status, request body and response body when the status is not one the
//! endpoint expects. The response is returned unchanged; callers decide what
//! a non-success status means:
//!
//! ```no_run
//! use digestcall::{RequestClient, StatusCheck};
//!
//! # async fn example(client: RequestClient) -> Result<(), digestcall::Error> {
//! let response = StatusCheck::new([200, 404])
//!     .call(|| client.get("/todos/42"))
//!     .await?;
//!
//! if response.status_code() == 404 {
//!     println!("no such todo");
//! }
//!
//! // Opt in to a typed error instead
//! let response = StatusCheck::new(200).enforce(client.get("/todos").await?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Digest authentication** - MD5, MD5-sess, SHA-256 and SHA-256-sess, `qop=auth` and `auth-int`
//! - **Explicit configuration** - [`ApiConfig`] from code, TOML, or environment variables
//! - **Structured logging** - `tracing` events for every call
//! - **Safe defaults** - TLS verification on and a 30 second timeout unless configured otherwise
//! - **No hidden state** - no connection pool, no caching, no retries
//!
//! ## Digest challenges
//!
//! The [`auth`] module is public: [`auth::DigestChallenge`] parses a
//! `WWW-Authenticate` value and builds the matching `Authorization` header,
//! and [`auth::find_digest_challenge`] picks the Digest challenge out of a
//! response's headers. [`RequestClient`] uses both internally, so most
//! callers never need them.

mod api;
pub mod auth;
mod client;
mod config;
mod error;
mod options;
mod response;
mod status_check;

pub use api::Api;
pub use auth::Credentials;
pub use client::{RequestClient, RequestClientBuilder, Scheme, DEFAULT_BASE_PATH, DEFAULT_TIMEOUT};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use options::{Body, RequestOptions};
pub use response::{HttpResponse, RequestRecord};
pub use status_check::{AllowedStatus, StatusCheck, StatusOutcome};
