//! The raw response returned by every call.
//!
//! [`HttpResponse`] keeps the status, headers and body of the reply together
//! with a [`RequestRecord`] of what was sent, so a status check can report the
//! full exchange without holding on to the transport.

use crate::{Error, Result};
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// What was sent for a given response.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// The HTTP method.
    pub method: Method,
    /// The full URL, including query parameters.
    pub url: String,
    /// The body that was sent, if any, decoded lossily as UTF-8.
    pub body: Option<String>,
}

/// A completed HTTP exchange.
///
/// Returned unchanged whatever its status: callers that need to detect
/// failure inspect [`status`](Self::status) or use
/// [`StatusCheck::enforce`](crate::StatusCheck::enforce).
///
/// # Examples
///
/// ```
/// # use digestcall::{HttpResponse, RequestRecord};
/// # use http::{HeaderMap, Method, StatusCode};
/// # use std::time::Duration;
/// let response = HttpResponse::new(
///     StatusCode::OK,
///     HeaderMap::new(),
///     r#"[{"id":1}]"#.to_string(),
///     RequestRecord {
///         method: Method::GET,
///         url: "https://api.example.com/api/todos".to_string(),
///         body: None,
///     },
///     Duration::from_millis(12),
/// );
///
/// assert!(response.is_success());
/// let todos: Vec<serde_json::Value> = response.json().unwrap();
/// assert_eq!(todos.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body.
    pub body: String,

    /// The request that produced this response.
    pub request: RequestRecord,

    /// Time from sending the request until the body was read, including a
    /// digest challenge round-trip.
    pub latency: Duration,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: String,
        request: RequestRecord,
        latency: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request,
            latency,
        }
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response body.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserializes the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] with the raw body if it does not
    /// match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| Error::Deserialization {
            status: self.status,
            raw_body: self.body.clone(),
            serde_error: e.to_string(),
        })
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}
