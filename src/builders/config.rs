//! Configuration Builder
//!
//! Fluent builder for target configuration.

use std::time::Duration;

use crate::error::{QueryError, QueryResult};
use crate::types::{
    ApiVariant, ApiVersion, Credentials, GrantType, TargetConfig, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_PAGE_LIMIT, DEFAULT_TIMEOUT,
};
use secrecy::SecretString;

/// Target configuration builder.
pub struct TargetConfigBuilder {
    variant: ApiVariant,
    address: Option<String>,
    port: Option<u16>,
    api_version: Option<String>,
    grant_type: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    verify_ssl: bool,
    timeout: Duration,
    page_limit: u32,
    max_connections: usize,
    max_response_size: usize,
}

impl TargetConfigBuilder {
    /// Create new configuration builder for an API variant.
    pub fn new(variant: ApiVariant) -> Self {
        Self {
            variant,
            address: None,
            port: None,
            api_version: None,
            grant_type: None,
            username: None,
            password: None,
            client_id: None,
            client_secret: None,
            verify_ssl: false,
            timeout: DEFAULT_TIMEOUT,
            page_limit: DEFAULT_PAGE_LIMIT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }

    /// Set host name, IP address or URL.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set port (defaults per variant).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set API version string.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set grant type (only `password` is accepted).
    pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = Some(grant_type.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub fn password_secret(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    pub fn client_secret_secret(mut self, client_secret: SecretString) -> Self {
        self.client_secret = Some(client_secret);
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set default page size for offset pagination.
    pub fn page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Set maximum concurrent in-flight requests.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set maximum accepted response body size.
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Build and validate the target configuration.
    pub fn build(self) -> QueryResult<TargetConfig> {
        let grant_type = match self.grant_type.as_deref() {
            Some(value) => GrantType::parse(value)?,
            None => GrantType::default(),
        };

        let api_version = ApiVersion::parse(
            self.api_version
                .as_deref()
                .unwrap_or_else(|| self.variant.default_api_version()),
        )?;

        let config = TargetConfig {
            variant: self.variant,
            address: self.address.unwrap_or_default(),
            port: self.port.unwrap_or_else(|| self.variant.default_port()),
            api_version,
            grant_type,
            credentials: Credentials {
                username: self.username.unwrap_or_default(),
                password: self
                    .password
                    .unwrap_or_else(|| SecretString::new(String::new())),
                client_id: self.client_id,
                client_secret: self.client_secret,
            },
            verify_ssl: self.verify_ssl,
            timeout: self.timeout,
            page_limit: self.page_limit,
            max_connections: self.max_connections.max(1),
            max_response_size: self.max_response_size,
        };

        config.validate().map_err(QueryError::from)?;
        Ok(config)
    }
}

/// Create a new target configuration builder.
pub fn target_config(variant: ApiVariant) -> TargetConfigBuilder {
    TargetConfigBuilder::new(variant)
}
