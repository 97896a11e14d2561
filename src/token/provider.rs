//! Token Provider
//!
//! Obtains access tokens through the password or refresh grant and keeps
//! them in the shared [`TokenCache`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{excerpt, AuthenticationError, ProtocolError, QueryError, QueryResult};
use crate::token::TokenCache;
use crate::types::{CachedToken, IssuedToken, TargetConfig, TokenResponse, TOKEN_EXPIRY_MARGIN, USER_AGENT};

/// Token provider interface.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a valid access token for the target.
    ///
    /// With `force_new` an exchange is always performed. The returned token
    /// reports whether it was issued by this call.
    async fn acquire_token(&self, target: &TargetConfig, force_new: bool) -> QueryResult<IssuedToken>;
}

/// Default token provider backed by the token endpoint of the target.
pub struct DefaultTokenProvider<T: HttpTransport> {
    cache: Arc<TokenCache>,
    transport: Arc<T>,
    margin: Duration,
}

impl<T: HttpTransport> DefaultTokenProvider<T> {
    /// Create new token provider.
    pub fn new(cache: Arc<TokenCache>, transport: Arc<T>) -> Self {
        Self {
            cache,
            transport,
            margin: TOKEN_EXPIRY_MARGIN,
        }
    }

    /// Override the expiry safety margin.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    fn build_password_body(&self, target: &TargetConfig) -> QueryResult<String> {
        let credentials = &target.credentials;
        let mut params = vec![
            ("grant_type", target.grant_type.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret().as_str()),
        ];

        if target.variant.requires_client_credentials() {
            if let Some(client_id) = &credentials.client_id {
                params.push(("client_id", client_id.as_str()));
            }
            if let Some(secret) = &credentials.client_secret {
                params.push(("client_secret", secret.expose_secret().as_str()));
            }
        }

        encode_form(&params)
    }

    fn build_refresh_body(&self, refresh_token: &str) -> QueryResult<String> {
        encode_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
    }

    fn build_headers(&self, target: &TargetConfig) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), USER_AGENT.to_string());
        headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        headers.insert("accept".to_string(), "application/json".to_string());
        if target.variant.sends_version_header() {
            headers.insert(
                "x-api-version".to_string(),
                target.api_version.to_string(),
            );
        }
        headers
    }

    async fn exchange(
        &self,
        target: &TargetConfig,
        body: String,
        issued_at: DateTime<Utc>,
    ) -> QueryResult<CachedToken> {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: target.token_url(),
            headers: self.build_headers(target),
            body: Some(body),
            timeout: Some(target.timeout),
        };

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(AuthenticationError::TokenExchangeFailed {
                status: response.status,
                body: excerpt(&response.body),
            }
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            AuthenticationError::InvalidTokenResponse {
                status: response.status,
                body: excerpt(&response.body),
                message: e.to_string(),
            }
        })?;

        if token.access_token.is_empty() {
            return Err(AuthenticationError::InvalidTokenResponse {
                status: response.status,
                body: excerpt(&response.body),
                message: "empty access_token".to_string(),
            }
            .into());
        }

        let expires_in = token.expires_in;
        let cached = CachedToken::from_response(token, issued_at, self.margin).ok_or_else(|| {
            AuthenticationError::InvalidTokenResponse {
                status: response.status,
                body: excerpt(&response.body),
                message: format!("expires_in {} is out of range", expires_in),
            }
        })?;

        debug!(expires_in, "Token expires in {} seconds", expires_in);
        Ok(cached)
    }
}

#[async_trait]
impl<T: HttpTransport> TokenProvider for DefaultTokenProvider<T> {
    async fn acquire_token(&self, target: &TargetConfig, force_new: bool) -> QueryResult<IssuedToken> {
        target.validate()?;

        let identity = target.identity();
        let mut entries = self.cache.lock().await;
        let now = Utc::now();
        let cached = entries.get(&identity).cloned();

        if let Some(token) = cached.as_ref().filter(|t| !force_new && !t.is_expired_at(now)) {
            return Ok(IssuedToken::new(token.access_token.clone(), false));
        }

        let refresh_token = cached
            .as_ref()
            .and_then(|t| t.refresh_token.as_ref())
            .filter(|_| target.variant.supports_refresh())
            .map(|t| t.expose_secret().to_string());

        let token = match refresh_token {
            Some(refresh_token) => {
                debug!(api_url = %identity.api_url, username = %identity.username, "Refreshing access token");
                let body = self.build_refresh_body(&refresh_token)?;
                match self.exchange(target, body, now).await {
                    Ok(token) => token,
                    Err(e) => {
                        warn!(api_url = %identity.api_url, error = %e, "Token refresh failed");
                        if let Some(stale) = cached {
                            entries.insert(identity, CachedToken::invalidated(stale.access_token));
                        }
                        return Err(e);
                    }
                }
            }
            None => {
                info!(api_url = %identity.api_url, username = %identity.username, "Requesting new access token");
                let body = self.build_password_body(target)?;
                self.exchange(target, body, now).await?
            }
        };

        let access_token = token.access_token.clone();
        entries.insert(identity, token);

        Ok(IssuedToken::new(access_token, true))
    }
}

fn encode_form(params: &[(&str, &str)]) -> QueryResult<String> {
    serde_urlencoded::to_string(params).map_err(|e| {
        QueryError::Protocol(ProtocolError::InvalidJson {
            message: format!("Failed to encode form body: {}", e),
        })
    })
}
