//! Collectors
//!
//! Monitoring checks built on [`VeeamClient`](crate::VeeamClient). Each
//! collector queries one Backup & Replication endpoint and maps the raw
//! records to flat items. Required fields are enforced by typed records; a
//! record missing one fails the whole check.

pub mod backups;
pub mod health;
pub mod jobs;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{ProtocolError, QueryError, QueryResult};

pub use backups::{collect_backups, collect_backups_since, BackupItem, BackupsCheck};
pub use health::{collect_health, HealthCheck, HealthItem};
pub use jobs::{collect_jobs, JobItem, JobsCheck};

/// Bound a whole check by `deadline`.
pub async fn run_with_deadline<F, T>(deadline: Duration, check: F) -> QueryResult<T>
where
    F: Future<Output = QueryResult<T>>,
{
    match tokio::time::timeout(deadline, check).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?deadline, "Check deadline exceeded");
            Err(QueryError::Timeout { timeout: deadline })
        }
    }
}

pub(crate) fn parse_record<R: DeserializeOwned>(endpoint: &str, record: Value) -> QueryResult<R> {
    serde_json::from_value(record).map_err(|e| {
        QueryError::Protocol(ProtocolError::InvalidRecord {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    })
}
