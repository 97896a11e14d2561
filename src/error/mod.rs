//! Query Error Types
//!
//! Error hierarchy for the authenticated query layer.

use std::time::Duration;
use thiserror::Error;

/// Root error type for Veeam queries.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl QueryError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "VEEAM_CONFIG",
            Self::Authentication(_) => "VEEAM_AUTH",
            Self::Http(_) => "VEEAM_HTTP",
            Self::Timeout { .. } => "VEEAM_TIMEOUT",
            Self::Network(_) => "VEEAM_NETWORK",
            Self::Protocol(_) => "VEEAM_PROTOCOL",
        }
    }

    /// Whether the next scheduled run may succeed without operator action.
    ///
    /// Nothing is retried inside a single call; this only informs the
    /// scheduler. Configuration errors need the config fixed first.
    pub fn is_retryable_next_run(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication(e) => e.status(),
            Self::Http(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Configuration error. Always names the offending field or value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Unsupported grant type `{grant_type}`, only `password` is supported")]
    UnsupportedGrantType { grant_type: String },

    #[error("Unsupported API version `{version}` (supported: {supported})")]
    UnsupportedApiVersion { version: String, supported: String },

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Invalid request path `{path}`, must start with `/`")]
    InvalidPath { path: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ConfigurationError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingRequired {
            field: field.to_string(),
        }
    }
}

/// Authentication error.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Token exchange failed with HTTP {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("Invalid token response (HTTP {status}): {message}")]
    InvalidTokenResponse {
        status: u16,
        body: String,
        message: String,
    },

    #[error("Request rejected with HTTP {status} using a freshly issued token: {body}")]
    Rejected { status: u16, body: String },
}

impl AuthenticationError {
    /// HTTP status of the failed exchange or request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchangeFailed { status, .. }
            | Self::InvalidTokenResponse { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
        }
    }
}

/// Non-2xx, non-401 response from a data endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status}: {body}")]
pub struct HttpError {
    pub status: u16,
    pub body: String,
}

/// Network/transport error other than a timeout.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("HTTP client could not be created: {message}")]
    ClientBuild { message: String },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Invalid URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid record from {endpoint}: {message}")]
    InvalidRecord { endpoint: String, message: String },
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Truncate a response body for inclusion in an error.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 1024;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = QueryError::from(ConfigurationError::missing("username"));
        assert_eq!(err.error_code(), "VEEAM_CONFIG");
        assert!(!err.is_retryable_next_run());

        let err = QueryError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.error_code(), "VEEAM_TIMEOUT");
        assert!(err.is_retryable_next_run());
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = QueryError::from(ConfigurationError::missing("password"));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field: password"
        );
    }

    #[test]
    fn test_status_extraction() {
        let err = QueryError::from(HttpError {
            status: 503,
            body: "unavailable".to_string(),
        });
        assert_eq!(err.status(), Some(503));

        let err = QueryError::from(AuthenticationError::Rejected {
            status: 401,
            body: String::new(),
        });
        assert_eq!(err.status(), Some(401));

        let err = QueryError::Timeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let body = "é".repeat(1000);
        let short = excerpt(&body);
        assert!(short.ends_with("..."));
        assert!(short.len() <= 1024 + 3);

        assert_eq!(excerpt("short"), "short");
    }
}
