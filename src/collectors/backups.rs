//! Backups check.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::VeeamClient;
use crate::collectors::parse_record;
use crate::core::HttpTransport;
use crate::error::{ConfigurationError, ProtocolError, QueryError, QueryResult};
use crate::types::{QueryRequest, DEFAULT_PAGE_LIMIT};
use crate::utils::str_to_timestamp;

const ENDPOINT: &str = "/backups";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupRecord {
    id: String,
    name: String,
    platform_name: String,
    platform_id: String,
    creation_time: String,
    job_id: Option<String>,
    policy_unique_id: Option<String>,
    repository_id: Option<String>,
}

/// One backup created inside the age window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupItem {
    /// Backup id.
    pub name: String,
    pub job_id: Option<String>,
    pub policy_unique_id: Option<String>,
    pub display_name: String,
    pub platform_name: String,
    pub platform_id: String,
    /// Unix seconds.
    pub creation_time: i64,
    pub repository_id: Option<String>,
}

impl TryFrom<BackupRecord> for BackupItem {
    type Error = QueryError;

    fn try_from(record: BackupRecord) -> QueryResult<Self> {
        let creation_time = str_to_timestamp(Some(&record.creation_time))
            .ok()
            .flatten()
            .ok_or_else(|| {
                QueryError::Protocol(ProtocolError::InvalidRecord {
                    endpoint: ENDPOINT.to_string(),
                    message: format!("invalid creationTime `{}`", record.creation_time),
                })
            })?;

        Ok(Self {
            name: record.id,
            job_id: record.job_id,
            policy_unique_id: record.policy_unique_id,
            display_name: record.name,
            platform_name: record.platform_name,
            platform_id: record.platform_id,
            creation_time,
            repository_id: record.repository_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackupsCheck {
    pub backups: Vec<BackupItem>,
}

/// List backups created in the last `max_age_days` days.
pub async fn collect_backups<T: HttpTransport>(
    client: &VeeamClient<T>,
    max_age_days: u32,
) -> QueryResult<BackupsCheck> {
    let after = chrono::Duration::try_days(i64::from(max_age_days))
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .ok_or_else(|| ConfigurationError::InvalidConfig {
            message: format!("backupMaxAge of {} days is out of range", max_age_days),
        })?;
    collect_backups_since(client, after).await
}

/// List backups created after `after`.
pub async fn collect_backups_since<T: HttpTransport>(
    client: &VeeamClient<T>,
    after: DateTime<Utc>,
) -> QueryResult<BackupsCheck> {
    let filter = after.to_rfc3339_opts(SecondsFormat::Secs, true);
    debug!(created_after = %filter, "Collecting backups");

    let request = QueryRequest::new(ENDPOINT)
        .param("limit", DEFAULT_PAGE_LIMIT)
        .param("createdAfterFilter", filter);
    let records = client.fetch_all(request).await?;

    let backups = records
        .into_iter()
        .map(|r| parse_record::<BackupRecord>(ENDPOINT, r).and_then(BackupItem::try_from))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(BackupsCheck { backups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MockHttpTransport;
    use crate::token::TokenCache;
    use crate::types::{ApiVariant, TargetConfig};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: &Arc<MockHttpTransport>) -> VeeamClient<MockHttpTransport> {
        let config = TargetConfig::builder(ApiVariant::BackupReplication)
            .address("veeam.local")
            .username("svc")
            .password("secret")
            .build()
            .unwrap();
        VeeamClient::with_transport(config, TokenCache::shared(), transport.clone())
    }

    fn backup(id: &str, creation_time: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Backup {}", id),
            "platformName": "VMware",
            "platformId": "00000000-0000-0000-0000-000000000000",
            "creationTime": creation_time,
            "jobId": "j-1",
            "repositoryId": "r-1"
        })
    }

    #[tokio::test]
    async fn test_collect_backups_since() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(
            200,
            &json!({"data": [backup("b-1", "2024-05-01T12:00:00+02:00")], "pagination": {"total": 1}}),
        );
        let client = client(&transport);
        let after = Utc.with_ymd_and_hms(2024, 4, 24, 0, 0, 0).unwrap();

        let check = collect_backups_since(&client, after).await.unwrap();
        let item = &check.backups[0];
        assert_eq!(item.name, "b-1");
        assert_eq!(item.display_name, "Backup b-1");
        assert_eq!(item.creation_time, 1_714_557_600);
        assert_eq!(item.policy_unique_id, None);
        assert_eq!(item.repository_id.as_deref(), Some("r-1"));

        let url = transport.get_last_request().unwrap().url;
        assert_eq!(
            url,
            "https://veeam.local:9419/v1/backups?createdAfterFilter=2024-04-24T00%3A00%3A00Z&limit=2000&skip=0"
        );
    }

    #[tokio::test]
    async fn test_collect_backups_sends_age_filter() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(200, &json!({"data": [], "pagination": {"total": 0}}));
        let client = client(&transport);

        let check = collect_backups(&client, 7).await.unwrap();
        assert!(check.backups.is_empty());

        let url = url::Url::parse(&transport.get_last_request().unwrap().url).unwrap();
        let filter = url
            .query_pairs()
            .find(|(k, _)| k == "createdAfterFilter")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let after = DateTime::parse_from_rfc3339(&filter).unwrap().with_timezone(&Utc);
        let age = Utc::now().signed_duration_since(after);
        assert!(age >= chrono::Duration::days(7));
        assert!(age < chrono::Duration::days(7) + chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_out_of_range_max_age_is_config_error() {
        let transport = Arc::new(MockHttpTransport::new());
        let client = client(&transport);

        for days in [200_000_000, u32::MAX] {
            let err = collect_backups(&client, days).await.unwrap_err();
            assert!(matches!(
                err,
                QueryError::Configuration(ConfigurationError::InvalidConfig { .. })
            ));
        }
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_creation_time_fails_check() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(
            200,
            &json!({"data": [backup("b-1", "not a date")], "pagination": {"total": 1}}),
        );
        let client = client(&transport);

        let err = collect_backups(&client, 7).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Protocol(ProtocolError::InvalidRecord { .. })
        ));
    }
}
