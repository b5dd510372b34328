//! HTTP client contract.
//!
//! The core never opens sockets. `curl` builds an [`HttpRequest`] and hands
//! it to whatever [`HttpClient`] the session was constructed with; tests
//! inject [`MockHttpClient`].

mod allow;

pub use allow::host_allowed;

use std::collections::HashMap;
use std::sync::Mutex;

/// Network policy for a session.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub enabled: bool,
    /// Host patterns: literal host, `*.domain`, or `*`/`**` for any.
    pub allow_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
    pub follow_redirects: bool,
    pub insecure: bool,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: HashMap::new(),
            body: None,
            timeout_ms: 30_000,
            follow_redirects: false,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Ordered (name, value) pairs as received.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Failure reasons, mirroring the errno-style names curl prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    Timeout,
    ConnectionRefused,
    DnsFailure,
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Timeout => write!(f, "Connection timed out"),
            HttpError::ConnectionRefused => write!(f, "Connection refused"),
            HttpError::DnsFailure => write!(f, "Could not resolve host"),
            HttpError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// The injected transport. Implementations are expected to be thread-safe;
/// the core itself only ever calls from one thread.
pub trait HttpClient: Send + Sync {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Extract the host portion of an http(s) URL (no port, no userinfo).
pub fn url_host(url: &str) -> Option<String> {
    let rest = url.strip_prefix("http://").or_else(|| url.strip_prefix("https://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit('@').next()?;
    let host = authority.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// A scripted client for tests: queue responses, record requests.
pub struct MockHttpClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self { responses: Mutex::new(Vec::new()), requests: Mutex::new(Vec::new()) }
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, error: HttpError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for MockHttpClient {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(HttpError::Other("no scripted response".to_string()))
        } else {
            responses.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_host_basic() {
        assert_eq!(url_host("http://example.com/a/b"), Some("example.com".to_string()));
        assert_eq!(url_host("https://API.Example.com"), Some("api.example.com".to_string()));
    }

    #[test]
    fn test_url_host_strips_port_and_userinfo() {
        assert_eq!(url_host("http://localhost:8080/x"), Some("localhost".to_string()));
        assert_eq!(url_host("https://user:pw@host.net/p"), Some("host.net".to_string()));
    }

    #[test]
    fn test_url_host_rejects_other_schemes() {
        assert_eq!(url_host("ftp://example.com"), None);
        assert_eq!(url_host("example.com"), None);
    }

    #[test]
    fn test_mock_client_replays_in_order() {
        let client = MockHttpClient::new().reply(200, "first").fail(HttpError::Timeout);
        let req = HttpRequest::get("http://example.com");
        assert_eq!(client.fetch(&req).unwrap().body, "first");
        assert_eq!(client.fetch(&req).unwrap_err(), HttpError::Timeout);
        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }
}
