//! Jobs check.

use serde::{Deserialize, Serialize};

use crate::client::VeeamClient;
use crate::collectors::parse_record;
use crate::core::HttpTransport;
use crate::error::QueryResult;
use crate::types::{QueryRequest, DEFAULT_PAGE_LIMIT};

const ENDPOINT: &str = "/jobs";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    job_type: String,
    is_disabled: Option<bool>,
    description: Option<String>,
    is_high_priority: Option<bool>,
}

/// One configured backup job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobItem {
    /// Job id.
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub is_disabled: Option<bool>,
    pub description: Option<String>,
    pub is_high_priority: Option<bool>,
}

impl From<JobRecord> for JobItem {
    fn from(record: JobRecord) -> Self {
        Self {
            name: record.id,
            display_name: record.name,
            job_type: record.job_type,
            is_disabled: record.is_disabled,
            description: record.description,
            is_high_priority: record.is_high_priority,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobsCheck {
    pub jobs: Vec<JobItem>,
}

/// List all jobs.
pub async fn collect_jobs<T: HttpTransport>(client: &VeeamClient<T>) -> QueryResult<JobsCheck> {
    let request = QueryRequest::new(ENDPOINT).param("limit", DEFAULT_PAGE_LIMIT);
    let records = client.fetch_all(request).await?;

    let jobs = records
        .into_iter()
        .map(|r| parse_record::<JobRecord>(ENDPOINT, r).map(JobItem::from))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(JobsCheck { jobs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MockHttpTransport;
    use crate::error::{ProtocolError, QueryError};
    use crate::token::TokenCache;
    use crate::types::{ApiVariant, TargetConfig};
    use pretty_assertions::assert_eq;
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

    #[tokio::test]
    async fn test_collect_jobs_maps_records() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(
            200,
            &json!({
                "data": [
                    {"id": "j-1", "name": "Nightly", "type": "Backup", "isDisabled": false,
                     "description": "all VMs", "isHighPriority": true, "schedule": {}},
                    {"id": "j-2", "name": "Copy", "type": "BackupCopy"}
                ],
                "pagination": {"total": 2}
            }),
        );
        let client = client(&transport);

        let check = collect_jobs(&client).await.unwrap();
        assert_eq!(
            check.jobs[0],
            JobItem {
                name: "j-1".to_string(),
                display_name: "Nightly".to_string(),
                job_type: "Backup".to_string(),
                is_disabled: Some(false),
                description: Some("all VMs".to_string()),
                is_high_priority: Some(true),
            }
        );
        assert_eq!(check.jobs[1].is_disabled, None);

        let output = serde_json::to_value(&check).unwrap();
        assert_eq!(output["jobs"][0]["displayName"], "Nightly");
        assert_eq!(output["jobs"][0]["type"], "Backup");
        assert_eq!(output["jobs"][1]["description"], serde_json::Value::Null);

        let url = transport.get_last_request().unwrap().url;
        assert_eq!(url, "https://veeam.local:9419/v1/jobs?limit=2000&skip=0");
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_check() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(
            200,
            &json!({"data": [{"id": "j-1", "name": "Nightly"}], "pagination": {"total": 1}}),
        );
        let client = client(&transport);

        let err = collect_jobs(&client).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Protocol(ProtocolError::InvalidRecord { .. })
        ));
    }
}
