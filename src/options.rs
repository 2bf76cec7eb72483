//! Per-request options: extra headers, query parameters and body.

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// The body sent with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes, sent as-is.
    Bytes(Vec<u8>),
    /// A JSON document, sent with `Content-Type: application/json`.
    Json(serde_json::Value),
}

impl Body {
    /// Returns the bytes that go on the wire, or `None` for an empty body.
    pub(crate) fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Body::Empty => None,
            Body::Bytes(bytes) => Some(bytes.clone()),
            Body::Json(value) => Some(value.to_string().into_bytes()),
        }
    }

    pub(crate) fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Json(_) => Some("application/json"),
            _ => None,
        }
    }
}

/// Options for an individual request.
///
/// # Examples
///
/// ```
/// use digestcall::RequestOptions;
///
/// let options = RequestOptions::new()
///     .with_query_param("page", "2")
///     .with_header("X-Trace", "abc")
///     .unwrap();
///
/// assert_eq!(options.query_params, vec![("page".to_string(), "2".to_string())]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Query parameters, appended in order.
    pub query_params: Vec<(String, String)>,

    /// The request body.
    pub body: Body,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, crate::Error> {
        let value = serde_json::to_value(body)
            .map_err(|e| crate::Error::SerializationFailed(e.to_string()))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    /// Sets a raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body_bytes_and_content_type() {
        let options = RequestOptions::new()
            .with_json(&json!({"title": "write docs"}))
            .unwrap();

        assert_eq!(options.body.content_type(), Some("application/json"));
        assert_eq!(
            options.body.to_bytes().unwrap(),
            br#"{"title":"write docs"}"#.to_vec()
        );
    }

    #[test]
    fn test_empty_body_has_no_bytes() {
        let options = RequestOptions::new();
        assert_eq!(options.body, Body::Empty);
        assert!(options.body.to_bytes().is_none());
        assert!(options.body.content_type().is_none());
    }

    #[test]
    fn test_query_params_keep_order() {
        let options = RequestOptions::new()
            .with_query_param("b", "2")
            .with_query_params(vec![("a".to_string(), "1".to_string())]);

        assert_eq!(
            options.query_params,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_header_is_configuration_error() {
        let result = RequestOptions::new().with_header("bad header", "x");
        assert!(matches!(result, Err(crate::Error::ConfigurationError(_))));
    }
}
