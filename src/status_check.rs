//! Status-code checking and logging around endpoint calls.
//!
//! A [`StatusCheck`] wraps one endpoint call. It runs the call once,
//! compares the response status with the endpoint's [`AllowedStatus`] set and
//! logs the outcome. The response is handed back unchanged either way; a
//! mismatch only shows up in the logs unless the caller opts into
//! [`StatusCheck::enforce`].

use crate::{Error, HttpResponse, Result};
use http::StatusCode;
use std::collections::BTreeSet;
use std::future::Future;
use std::ops::RangeInclusive;

/// The set of status codes an endpoint treats as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedStatus(BTreeSet<u16>);

impl AllowedStatus {
    /// Returns `true` if `code` is in the set.
    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    /// Returns the codes in ascending order.
    pub fn codes(&self) -> Vec<u16> {
        self.0.iter().copied().collect()
    }
}

impl From<u16> for AllowedStatus {
    fn from(code: u16) -> Self {
        Self(BTreeSet::from([code]))
    }
}

impl From<StatusCode> for AllowedStatus {
    fn from(code: StatusCode) -> Self {
        Self::from(code.as_u16())
    }
}

impl<const N: usize> From<[u16; N]> for AllowedStatus {
    fn from(codes: [u16; N]) -> Self {
        codes.into_iter().collect()
    }
}

impl From<&[u16]> for AllowedStatus {
    fn from(codes: &[u16]) -> Self {
        codes.iter().copied().collect()
    }
}

impl From<Vec<u16>> for AllowedStatus {
    fn from(codes: Vec<u16>) -> Self {
        codes.into_iter().collect()
    }
}

impl From<RangeInclusive<u16>> for AllowedStatus {
    fn from(codes: RangeInclusive<u16>) -> Self {
        codes.collect()
    }
}

impl FromIterator<u16> for AllowedStatus {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of comparing a response with the allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The status is in the allowed set.
    Allowed,
    /// The status is outside the allowed set; error lines were logged.
    Mismatch,
}

/// Checks and logs the status of endpoint responses.
///
/// # Examples
///
/// ```no_run
/// use digestcall::{RequestClient, StatusCheck};
///
/// # async fn example(client: RequestClient) -> Result<(), digestcall::Error> {
/// // Logs "Called endpoint" on 200 or 201; logs error details otherwise.
/// let response = StatusCheck::new([200, 201])
///     .call(|| client.get("/todos"))
///     .await?;
///
/// // Silent: only mismatches are logged.
/// let response = StatusCheck::new(204)
///     .silent(true)
///     .call(|| client.delete("/todos/1"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StatusCheck {
    allowed: AllowedStatus,
    silent: bool,
}

impl StatusCheck {
    /// Creates a check accepting `allowed`: a single code, an array, a slice,
    /// a `Vec` or an inclusive range.
    pub fn new(allowed: impl Into<AllowedStatus>) -> Self {
        Self {
            allowed: allowed.into(),
            silent: false,
        }
    }

    /// Suppresses the info line for allowed responses.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Returns the allowed set.
    pub fn allowed(&self) -> &AllowedStatus {
        &self.allowed
    }

    /// Compares `response` with the allowed set and logs the outcome.
    pub fn inspect(&self, response: &HttpResponse) -> StatusOutcome {
        let method = &response.request.method;
        let url = &response.request.url;
        let status = response.status_code();

        if self.allowed.contains(status) {
            if !self.silent {
                tracing::info!(method = %method, url = %url, "Called endpoint");
            }
            return StatusOutcome::Allowed;
        }

        tracing::info!(method = %method, url = %url, "Called endpoint");
        tracing::error!(
            status = status,
            allowed = ?self.allowed.codes(),
            "Unexpected status code"
        );
        tracing::error!(
            body = %response.request.body.as_deref().unwrap_or(""),
            "Request body"
        );
        // JSON-escaped so multi-line or control characters stay on one log line
        let escaped = serde_json::to_string(&response.body).unwrap_or_default();
        tracing::error!(body = %escaped, "Response body");

        StatusOutcome::Mismatch
    }

    /// Runs `call` once, inspects its response and returns it unchanged.
    ///
    /// Errors from `call` are returned as-is without status logging.
    pub async fn call<F, Fut>(&self, call: F) -> Result<HttpResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HttpResponse>>,
    {
        let response = call().await?;
        self.inspect(&response);
        Ok(response)
    }

    /// Like [`inspect`](Self::inspect), but returns
    /// [`Error::StatusMismatch`] for a status outside the allowed set.
    pub fn enforce(&self, response: HttpResponse) -> Result<HttpResponse> {
        match self.inspect(&response) {
            StatusOutcome::Allowed => Ok(response),
            StatusOutcome::Mismatch => Err(Error::StatusMismatch {
                status: response.status,
                allowed: self.allowed.codes(),
                method: response.request.method,
                url: response.request.url,
                body: response.body,
            }),
        }
    }
}
