//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and consumes `HttpResponse` values; the host executes the actual
//! round-trip, either through a `Transport` implementation or from its own
//! event loop via the FFI layer.
//!
//! The query string is kept apart from the path so the API key can be left
//! out of log lines. All fields are owned so values cross FFI boundaries
//! without lifetime concerns.

use url::form_urlencoded;

use crate::error::CatalogError;

/// HTTP method for a request. The catalog is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// An HTTP request described as plain data.
///
/// Built by `CatalogClient::build_*`. `path` is an absolute URL without
/// query string; `query` holds the parameters in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Full URL including the form-encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{query}", self.path)
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a single request on behalf of a `CatalogSession`.
///
/// Non-2xx statuses must be returned as `Ok(HttpResponse)` so the core can
/// classify them; `Err` is reserved for failures where no response exists
/// (DNS, connection reset, timeout), normally `CatalogError::Transport`.
pub trait Transport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, CatalogError>;
}
