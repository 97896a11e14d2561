//! HTTP Transport
//!
//! HTTP client interface and implementations for token exchanges and
//! data queries.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::error::{NetworkError, ProtocolError, QueryError};
use crate::types::{
    TargetConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT,
};

/// HTTP request definition.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL, including the query string.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased names.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QueryError>;
}

/// Connection settings for [`ReqwestHttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub verify_ssl: bool,
    pub max_connections: usize,
    pub max_response_size: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl From<&TargetConfig> for TransportOptions {
    fn from(config: &TargetConfig) -> Self {
        Self {
            timeout: config.timeout,
            verify_ssl: config.verify_ssl,
            max_connections: config.max_connections,
            max_response_size: config.max_response_size,
        }
    }
}

/// Default reqwest-based HTTP transport.
///
/// One instance owns one connection pool. Idle connections are not kept
/// alive, so every request opens a fresh connection and no stale keep-alive
/// reaches a load-balanced backend. In-flight requests are capped by
/// `max_connections`.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    default_timeout: Duration,
    max_response_size: usize,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> Result<Self, QueryError> {
        Self::with_options(TransportOptions::default())
    }

    /// Create transport for a configured target.
    pub fn for_target(config: &TargetConfig) -> Result<Self, QueryError> {
        Self::with_options(TransportOptions::from(config))
    }

    /// Create transport with custom options.
    pub fn with_options(options: TransportOptions) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_ssl)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| {
                QueryError::Network(NetworkError::ClientBuild {
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(options.max_connections.max(1))),
            default_timeout: options.timeout,
            max_response_size: options.max_response_size,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QueryError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let _permit = self.permits.acquire().await.map_err(|e| {
            QueryError::Network(NetworkError::RequestFailed {
                message: e.to_string(),
            })
        })?;

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        req_builder = req_builder.timeout(timeout);

        let response = req_builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();

        // Collect headers
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string().to_lowercase(), v.to_string());
            }
        }

        // Check content length
        if let Some(len) = response.content_length() {
            if len as usize > self.max_response_size {
                return Err(QueryError::Protocol(ProtocolError::ResponseTooLarge {
                    size: len as usize,
                }));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        if body.len() > self.max_response_size {
            return Err(QueryError::Protocol(ProtocolError::ResponseTooLarge {
                size: body.len(),
            }));
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout: Duration) -> QueryError {
    if e.is_timeout() {
        QueryError::Timeout { timeout }
    } else if e.is_connect() {
        QueryError::Network(NetworkError::ConnectionFailed {
            message: e.to_string(),
        })
    } else {
        QueryError::Network(NetworkError::RequestFailed {
            message: e.to_string(),
        })
    }
}

/// Mock HTTP transport for testing.
///
/// Responses are returned in the order they were queued.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, QueryError>>>,
    request_history: Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response(&self, status: u16, body: &serde_json::Value) -> &Self {
        let response = HttpResponse {
            status,
            headers: [("content-type".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            body: body.to_string(),
        };
        self.queue_response(response)
    }

    /// Queue a plain-text response.
    pub fn queue_text_response(&self, status: u16, body: &str) -> &Self {
        self.queue_response(HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.to_string(),
        })
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: QueryError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().clone()
    }

    /// Requests sent with the given method.
    pub fn requests_with_method(&self, method: HttpMethod) -> Vec<HttpRequest> {
        self.request_history
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().last().cloned()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QueryError> {
        self.request_history.lock().push(request);

        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(QueryError::Network(NetworkError::ConnectionFailed {
                message: "No mock response available".to_string(),
            }))
        })
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QueryError> {
        (**self).send(request).await
    }
}
