//! HTTP client seam.
//!
//! Session acquisition and profile lookups only ever issue authorized GET
//! requests, so the trait is deliberately small. The production adapter is
//! [`ReqwestHttpClient`](crate::adapters::ReqwestHttpClient); tests use
//! [`MockHttpClient`](crate::adapters::mock::MockHttpClient).

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Build the header map carrying the ChatWatch credential.
///
/// The gateway expects the raw token in `authorization`, without a scheme.
pub fn authorization_headers(credential: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert("authorization".to_string(), credential.to_string());
    headers
}

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Convenience constructor for JSON bodies.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Failures raised by the HTTP layer itself, before any status is known.
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Connection refused, reset, or DNS failure
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// The URL could not be used
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for the HTTP calls the client makes.
///
/// # Example
///
/// ```ignore
/// use chatwatch::traits::{authorization_headers, HttpClient};
///
/// async fn probe<C: HttpClient>(client: &C, token: &str) -> bool {
///     match client.get("https://gateway.chatwatch.ksoft.si/acquire", &authorization_headers(token)).await {
///         Ok(response) => response.status == 200,
///         Err(_) => false,
///     }
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and buffer the whole body.
    ///
    /// Non-2xx statuses are returned as a [`Response`], not as an error.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_headers_use_raw_token() {
        let headers = authorization_headers("secret-token");
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("authorization"),
            Some(&"secret-token".to_string())
        );
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Acquire {
            url: String,
        }

        let response = Response::new(200, r#"{"url":"wss://n1.cw.ksoft.si/ws?session=a"}"#);
        let data: Acquire = response.json().unwrap();
        assert_eq!(data.url, "wss://n1.cw.ksoft.si/ws?session=a");
    }

    #[test]
    fn test_response_text_is_lossy() {
        let response = Response::new(500, vec![b'o', b'k', 0xff]);
        assert_eq!(response.text(), "ok\u{fffd}");
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(
            HttpError::ConnectionFailed("refused".to_string()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(
            HttpError::Timeout("30s".to_string()).to_string(),
            "Request timeout: 30s"
        );
        assert_eq!(
            HttpError::InvalidUrl("nope".to_string()).to_string(),
            "Invalid URL: nope"
        );
        assert_eq!(
            HttpError::Other("boom".to_string()).to_string(),
            "HTTP error: boom"
        );
    }
}
