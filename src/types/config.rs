//! Configuration Types
//!
//! Target, credential and API variant configuration.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::builders::TargetConfigBuilder;
use crate::error::{ConfigurationError, ProtocolError, QueryError};
use crate::pagination::PaginationStrategy;
use crate::types::CredentialIdentity;

/// Tokens are treated as expired this long before the server says so.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(120);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `limit` sent with offset-paginated requests.
pub const DEFAULT_PAGE_LIMIT: u32 = 2000;

/// Default ceiling on concurrent in-flight requests per client.
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Default maximum response body size (64 MiB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

/// Age limit in days for the backups collector.
pub const DEFAULT_BACKUP_MAX_AGE_DAYS: u32 = 7;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("integrations-veeam/", env!("CARGO_PKG_VERSION"));

/// Veeam REST API flavour.
///
/// Each variant fixes the token endpoint, the pagination shape and which
/// credential fields are required.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVariant {
    /// Veeam Backup & Replication REST API (`/v1`, offset pagination).
    BackupReplication,
    /// Veeam Backup for Microsoft 365 REST API (`/v{major}`, link pagination).
    Microsoft365,
}

impl ApiVariant {
    pub fn default_port(&self) -> u16 {
        match self {
            Self::BackupReplication => 9419,
            Self::Microsoft365 => 4443,
        }
    }

    pub fn default_api_version(&self) -> &'static str {
        match self {
            Self::BackupReplication => "1.2-rev1",
            Self::Microsoft365 => "8",
        }
    }

    /// Supported API major versions.
    pub fn supported_majors(&self) -> &'static [u32] {
        match self {
            Self::BackupReplication => &[1],
            Self::Microsoft365 => &[6, 7, 8],
        }
    }

    /// Pagination convention used by data endpoints.
    pub fn pagination(&self) -> PaginationStrategy {
        match self {
            Self::BackupReplication => PaginationStrategy::Offset,
            Self::Microsoft365 => PaginationStrategy::Link,
        }
    }

    /// Whether requests carry an `X-API-Version` header.
    pub fn sends_version_header(&self) -> bool {
        matches!(self, Self::BackupReplication)
    }

    /// Whether a cached refresh token may be exchanged instead of the password.
    pub fn supports_refresh(&self) -> bool {
        matches!(self, Self::BackupReplication)
    }

    /// Whether the password grant must include client id and secret.
    pub fn requires_client_credentials(&self) -> bool {
        matches!(self, Self::Microsoft365)
    }

    /// Path segment prepended to every data endpoint.
    pub fn api_segment(&self, version: &ApiVersion) -> String {
        match self {
            Self::BackupReplication => "/v1".to_string(),
            Self::Microsoft365 => format!("/v{}", version.major()),
        }
    }

    /// Token endpoint path, relative to the API root.
    pub fn token_path(&self, version: &ApiVersion) -> String {
        match self {
            Self::BackupReplication => "/oauth2/token".to_string(),
            Self::Microsoft365 => format!("{}/token", self.api_segment(version)),
        }
    }
}

/// API version string with its parsed major number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    raw: String,
    major: u32,
}

impl ApiVersion {
    /// Parse a version such as `1.2-rev1`, `v8` or `7`.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let trimmed = raw.trim();
        let digits: String = trimmed
            .trim_start_matches(['v', 'V'])
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        let major = digits
            .parse()
            .map_err(|_| ConfigurationError::UnsupportedApiVersion {
                version: raw.to_string(),
                supported: "a version starting with a major number".to_string(),
            })?;

        Ok(Self {
            raw: trimmed.to_string(),
            major,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Grant type used for the initial token exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantType {
    Password,
}

impl GrantType {
    pub fn parse(value: &str) -> Result<Self, ConfigurationError> {
        match value {
            "password" => Ok(Self::Password),
            other => Err(ConfigurationError::UnsupportedGrantType {
                grant_type: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
        }
    }
}

impl Default for GrantType {
    fn default() -> Self {
        Self::Password
    }
}

/// Credentials for the password grant.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Client identifier, required by some variants.
    pub client_id: Option<String>,
    /// Client secret, required by some variants.
    pub client_secret: Option<SecretString>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Fully resolved configuration for one monitored Veeam server.
#[derive(Clone, Debug)]
pub struct TargetConfig {
    pub variant: ApiVariant,
    /// Host name, IP address or URL as configured.
    pub address: String,
    pub port: u16,
    pub api_version: ApiVersion,
    pub grant_type: GrantType,
    pub credentials: Credentials,
    /// Verify the server's TLS certificate.
    ///
    /// Off by default: on-prem appliances usually run self-signed
    /// certificates. Enable it wherever a trusted certificate is deployed.
    pub verify_ssl: bool,
    /// Timeout applied to every network call unless a request overrides it.
    pub timeout: Duration,
    /// `limit` sent with offset-paginated requests that do not set one.
    pub page_limit: u32,
    pub max_connections: usize,
    pub max_response_size: usize,
}

impl TargetConfig {
    /// Create a new configuration builder.
    pub fn builder(variant: ApiVariant) -> TargetConfigBuilder {
        TargetConfigBuilder::new(variant)
    }

    /// Validate everything that must hold before any network call.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.address.trim().is_empty() {
            return Err(ConfigurationError::missing("address"));
        }
        if self.credentials.username.is_empty() {
            return Err(ConfigurationError::missing("username"));
        }
        if self.credentials.password.expose_secret().is_empty() {
            return Err(ConfigurationError::missing("password"));
        }

        if self.variant.requires_client_credentials() {
            if self.credentials.client_id.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigurationError::missing("clientId"));
            }
            let secret_empty = self
                .credentials
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true);
            if secret_empty {
                return Err(ConfigurationError::missing("clientSecret"));
            }
        }

        let supported = self.variant.supported_majors();
        if !supported.contains(&self.api_version.major()) {
            return Err(ConfigurationError::UnsupportedApiVersion {
                version: self.api_version.to_string(),
                supported: supported
                    .iter()
                    .map(|m| format!("{}.x", m))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if self.page_limit == 0 {
            return Err(ConfigurationError::InvalidConfig {
                message: "page limit must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Scheme, host and port, e.g. `https://veeam.local:9419`.
    pub fn api_url(&self) -> String {
        let address = self.address.trim().trim_end_matches('/');
        let lower = address.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            format!("{}:{}", address, self.port)
        } else {
            format!("https://{}:{}", address, self.port)
        }
    }

    /// Root of the versioned data API, with a trailing slash so that
    /// relative links resolve beneath it.
    pub fn base_url(&self) -> Result<Url, QueryError> {
        let raw = format!(
            "{}{}/",
            self.api_url(),
            self.variant.api_segment(&self.api_version)
        );
        parse_url(&raw)
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> String {
        format!(
            "{}{}",
            self.api_url(),
            self.variant.token_path(&self.api_version)
        )
    }

    /// URL of a data endpoint; `path` must start with `/`.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, QueryError> {
        if !path.starts_with('/') {
            return Err(ConfigurationError::InvalidPath {
                path: path.to_string(),
            }
            .into());
        }
        let raw = format!(
            "{}{}{}",
            self.api_url(),
            self.variant.api_segment(&self.api_version),
            path
        );
        parse_url(&raw)
    }

    /// Cache key for tokens issued to this target.
    pub fn identity(&self) -> CredentialIdentity {
        CredentialIdentity {
            api_url: self.api_url(),
            api_version: self.api_version.to_string(),
            username: self.credentials.username.clone(),
            client_id: self.credentials.client_id.clone(),
        }
    }

    pub fn pagination(&self) -> PaginationStrategy {
        self.variant.pagination()
    }
}

fn parse_url(raw: &str) -> Result<Url, QueryError> {
    Url::parse(raw).map_err(|e| {
        QueryError::Protocol(ProtocolError::InvalidUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })
    })
}
