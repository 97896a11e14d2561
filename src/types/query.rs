//! Query Types
//!
//! Request descriptions passed from collectors into the query layer.

use std::collections::BTreeMap;
use std::time::Duration;

/// One logical GET against a data endpoint.
///
/// The force-new-token flag of a retried request is internal to the
/// executor and never set by callers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryRequest {
    /// Endpoint path beginning with `/`, relative to the versioned API root.
    pub path: String,
    /// Query parameters, sent in key order.
    pub params: BTreeMap<String, String>,
    /// Per-call timeout overriding the target default.
    pub timeout: Option<Duration>,
}

impl QueryRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = QueryRequest::new("/backups")
            .param("limit", 2000)
            .param("createdAfterFilter", "2024-01-01T00:00:00")
            .timeout(Duration::from_secs(5));

        assert_eq!(request.path, "/backups");
        assert_eq!(request.params.get("limit").map(String::as_str), Some("2000"));
        assert_eq!(request.params.len(), 2);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }
}
