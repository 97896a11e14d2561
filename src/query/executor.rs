//! Authenticated Request Executor
//!
//! Sends bearer-authenticated GET requests and recovers once from a stale
//! token.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{excerpt, AuthenticationError, HttpError, ProtocolError, QueryResult};
use crate::token::TokenProvider;
use crate::types::{IssuedToken, TargetConfig, USER_AGENT};

/// Source of decoded JSON documents, one per GET.
///
/// The paginator is written against this interface so that every page goes
/// through the same authentication path.
#[async_trait]
pub trait JsonSource: Send + Sync {
    /// GET `url` and decode the body.
    async fn get_json(&self, url: &Url, timeout: Option<Duration>) -> QueryResult<Value>;
}

/// Executes data requests against one target.
pub struct QueryExecutor<T: HttpTransport, P: TokenProvider> {
    target: TargetConfig,
    transport: Arc<T>,
    provider: P,
}

impl<T: HttpTransport, P: TokenProvider> QueryExecutor<T, P> {
    /// Create new executor.
    pub fn new(target: TargetConfig, transport: Arc<T>, provider: P) -> Self {
        Self {
            target,
            transport,
            provider,
        }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn build_request(&self, url: &Url, token: &IssuedToken, timeout: Option<Duration>) -> HttpRequest {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), token.authorization_header());
        headers.insert("user-agent".to_string(), USER_AGENT.to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());
        headers.insert("accept".to_string(), "application/json".to_string());
        if self.target.variant.sends_version_header() {
            headers.insert(
                "x-api-version".to_string(),
                self.target.api_version.to_string(),
            );
        }

        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers,
            body: None,
            timeout: Some(timeout.unwrap_or(self.target.timeout)),
        }
    }
}

#[async_trait]
impl<T: HttpTransport, P: TokenProvider> JsonSource for QueryExecutor<T, P> {
    async fn get_json(&self, url: &Url, timeout: Option<Duration>) -> QueryResult<Value> {
        let mut force_new = false;

        loop {
            let token = self.provider.acquire_token(&self.target, force_new).await?;
            let request = self.build_request(url, &token, timeout);

            debug!(url = %url, "GET");
            let response = self.transport.send(request).await?;

            if response.status == 401 {
                if token.fresh {
                    return Err(AuthenticationError::Rejected {
                        status: response.status,
                        body: excerpt(&response.body),
                    }
                    .into());
                }
                warn!(url = %url, "Cached token rejected, requesting a new one");
                force_new = true;
                continue;
            }

            if !response.is_success() {
                return Err(HttpError {
                    status: response.status,
                    body: excerpt(&response.body),
                }
                .into());
            }

            return serde_json::from_str(&response.body).map_err(|e| {
                ProtocolError::InvalidJson {
                    message: format!("{} (body: {})", e, excerpt(&response.body)),
                }
                .into()
            });
        }
    }
}
