//! Veeam Integration Module
//!
//! Authenticated, paginated query layer for the Veeam Backup & Replication
//! and Veeam Backup for Microsoft 365 REST APIs.
//!
//! # Features
//!
//! - OAuth2 password grant with refresh-token renewal
//! - Process-wide token cache keyed by credential identity
//! - One transparent re-authentication when a cached token is rejected
//! - Offset (`limit`/`skip`) and link (`_links.next`) pagination
//! - Jobs, backups and health collectors for monitoring checks
//!
//! # Example
//!
//! ```rust,ignore
//! use integrations_veeam::{target_config, ApiVariant, QueryRequest, TokenCache, VeeamClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = TokenCache::shared();
//!
//!     let config = target_config(ApiVariant::BackupReplication)
//!         .address("veeam.example.com")
//!         .username("monitoring")
//!         .password("secret")
//!         .build()?;
//!
//!     let client = VeeamClient::new(config, cache.clone())?;
//!     let jobs = client.fetch_all(QueryRequest::new("/jobs")).await?;
//!     println!("{} jobs", jobs.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token and request types
//! - `error`: error hierarchy
//! - `builders`: fluent configuration builder
//! - `core`: HTTP transport
//! - `token`: token cache and provider
//! - `query`: authenticated request executor
//! - `pagination`: offset and link pagination
//! - `client`: client combining the above for one target
//! - `collectors`: monitoring checks

pub mod builders;
pub mod client;
pub mod collectors;
pub mod core;
pub mod error;
pub mod pagination;
pub mod query;
pub mod token;
pub mod types;
pub mod utils;

// Re-export main client
pub use client::VeeamClient;

// Re-export builders
pub use builders::{target_config, TargetConfigBuilder};

// Re-export errors
pub use error::{
    AuthenticationError, ConfigurationError, HttpError, NetworkError, ProtocolError, QueryError,
    QueryResult,
};

// Re-export types
pub use types::{
    // Config
    ApiVariant, ApiVersion, Credentials, GrantType, TargetConfig,
    // Probe
    AssetConfig, LocalConfig,
    // Token
    CachedToken, CredentialIdentity, IssuedToken, TokenResponse,
    // Query
    QueryRequest,
};

// Re-export core components
pub use crate::core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
    TransportOptions,
};

// Re-export token management
pub use token::{DefaultTokenProvider, TokenCache, TokenProvider};

// Re-export query and pagination
pub use pagination::{Page, PaginationStrategy, Paginator};
pub use query::{JsonSource, QueryExecutor};

// Re-export collectors
pub use collectors::{
    collect_backups, collect_backups_since, collect_health, collect_jobs, run_with_deadline,
    BackupItem, BackupsCheck, HealthCheck, HealthItem, JobItem, JobsCheck,
};
