//! Veeam Client
//!
//! Entry point for querying one configured target.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::QueryResult;
use crate::pagination::Paginator;
use crate::query::{JsonSource, QueryExecutor};
use crate::token::{DefaultTokenProvider, TokenCache};
use crate::types::{QueryRequest, TargetConfig};

/// Authenticated client for one Veeam server.
///
/// Tokens come from the shared [`TokenCache`] passed in at construction;
/// the connection pool belongs to the client and is reused across pages.
pub struct VeeamClient<T: HttpTransport = ReqwestHttpTransport> {
    executor: QueryExecutor<T, DefaultTokenProvider<T>>,
    paginator: Paginator,
}

impl VeeamClient<ReqwestHttpTransport> {
    /// Create client using the reqwest transport.
    ///
    /// Fails with a configuration error before any connection is opened.
    pub fn new(config: TargetConfig, cache: Arc<TokenCache>) -> QueryResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestHttpTransport::for_target(&config)?);
        Ok(Self::with_transport(config, cache, transport))
    }
}

impl<T: HttpTransport> VeeamClient<T> {
    /// Create client with a custom transport.
    pub fn with_transport(config: TargetConfig, cache: Arc<TokenCache>, transport: Arc<T>) -> Self {
        let paginator = Paginator::for_target(&config);
        let provider = DefaultTokenProvider::new(cache, transport.clone());
        Self {
            executor: QueryExecutor::new(config, transport, provider),
            paginator,
        }
    }

    pub fn config(&self) -> &TargetConfig {
        self.executor.target()
    }

    /// Fetch every record of a listing endpoint, all pages concatenated.
    pub async fn fetch_all(&self, request: QueryRequest) -> QueryResult<Vec<Value>> {
        let config = self.config();
        config.validate()?;
        let start = self.request_url(&request)?;
        let base = config.base_url()?;

        let records = self
            .paginator
            .fetch_all(&self.executor, &base, start, request.timeout)
            .await?;

        debug!(path = %request.path, count = records.len(), "Fetched all records");
        Ok(records)
    }

    /// Fetch a single document without pagination.
    pub async fn fetch_one(&self, request: QueryRequest) -> QueryResult<Value> {
        self.config().validate()?;
        let url = self.request_url(&request)?;
        self.executor.get_json(&url, request.timeout).await
    }

    fn request_url(&self, request: &QueryRequest) -> QueryResult<Url> {
        let mut url = self.config().endpoint_url(&request.path)?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }
        Ok(url)
    }
}
