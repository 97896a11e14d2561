//! Health check.

use serde::{Deserialize, Serialize};

use crate::client::VeeamClient;
use crate::collectors::parse_record;
use crate::core::HttpTransport;
use crate::error::QueryResult;
use crate::types::QueryRequest;

const ENDPOINT: &str = "/health";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentStatus {
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthEntries {
    #[serde(default)]
    configuration_db: ComponentStatus,
    #[serde(default)]
    nats: ComponentStatus,
}

#[derive(Debug, Deserialize)]
struct HealthRecord {
    status: String,
    #[serde(default)]
    entries: HealthEntries,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthItem {
    /// Always `health`.
    pub name: String,
    pub status: String,
    pub configuration_db: Option<String>,
    pub nats: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub health: Vec<HealthItem>,
}

/// Read the server health summary.
pub async fn collect_health<T: HttpTransport>(client: &VeeamClient<T>) -> QueryResult<HealthCheck> {
    let body = client.fetch_one(QueryRequest::new(ENDPOINT)).await?;
    let record: HealthRecord = parse_record(ENDPOINT, body)?;

    Ok(HealthCheck {
        health: vec![HealthItem {
            name: "health".to_string(),
            status: record.status,
            configuration_db: record.entries.configuration_db.status,
            nats: record.entries.nats.status,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MockHttpTransport;
    use crate::error::{ProtocolError, QueryError};
    use crate::token::TokenCache;
    use crate::types::{ApiVariant, TargetConfig};
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
    async fn test_collect_health() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(
            200,
            &json!({
                "status": "Healthy",
                "entries": {
                    "configurationDb": {"status": "Healthy"},
                    "nats": {"status": "Unhealthy", "message": "down"}
                }
            }),
        );
        let client = client(&transport);

        let check = collect_health(&client).await.unwrap();
        assert_eq!(
            check.health,
            vec![HealthItem {
                name: "health".to_string(),
                status: "Healthy".to_string(),
                configuration_db: Some("Healthy".to_string()),
                nats: Some("Unhealthy".to_string()),
            }]
        );
        assert_eq!(
            transport.get_last_request().unwrap().url,
            "https://veeam.local:9419/v1/health"
        );
    }

    #[tokio::test]
    async fn test_missing_entries_are_none() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(200, &json!({"status": "Healthy"}));
        let client = client(&transport);

        let check = collect_health(&client).await.unwrap();
        assert_eq!(check.health[0].configuration_db, None);
        assert_eq!(check.health[0].nats, None);

        let output = serde_json::to_value(&check).unwrap();
        assert_eq!(output["health"][0]["name"], "health");
        assert!(output["health"][0].get("configurationDb").is_some());
    }

    #[tokio::test]
    async fn test_missing_status_fails_check() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "tok", "expires_in": 900}));
        transport.queue_json_response(200, &json!({"entries": {}}));
        let client = client(&transport);

        let err = collect_health(&client).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Protocol(ProtocolError::InvalidRecord { .. })
        ));
    }
}
