//! HTTP-shaped request and response data model.
//!
//! [`EdgeRequest`] and [`EdgeResponse`] are the request representation handed
//! to the handler module and the response shape it produces. Both are plain
//! serde types: the server crate converts them to and from real HTTP, and the
//! core crate serializes them across the guest boundary as JSON.

use serde::{Deserialize, Serialize};
use url::Url;

/// One inbound network event's request data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request URI as received.
    pub uri: String,
    /// Request headers as key-value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Optional request body (UTF-8 text).
    #[serde(default)]
    pub body: Option<String>,
}

impl EdgeRequest {
    /// Create a new empty request.
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            method: method.to_string(),
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Check if the request has a JSON content type.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    /// Normalized lowercase request path.
    ///
    /// Handles both absolute URIs (`https://host/a/b?q`) and origin-form
    /// URIs (`/a/b?q`); falls back to the raw URI if neither parses.
    pub fn path(&self) -> String {
        if let Ok(url) = Url::parse(&self.uri) {
            return url.path().to_lowercase();
        }
        match self.uri.split('?').next() {
            Some(path) if !path.is_empty() => path.to_lowercase(),
            _ => self.uri.to_lowercase(),
        }
    }
}

/// The outbound HTTP-shaped result of handling one event.
///
/// Produced by the handler module on success, or by the fault boundary on
/// failure. Exactly one is delivered per inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as key-value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Response body (UTF-8 text).
    #[serde(default)]
    pub body: String,
}

impl EdgeResponse {
    /// Create a simple text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![(
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body: body.to_string(),
        }
    }

    /// Create a JSON response.
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    /// Create an empty response with just a status code.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Add a header to the response.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Default for EdgeResponse {
    fn default() -> Self {
        Self::text(200, "OK")
    }
}
