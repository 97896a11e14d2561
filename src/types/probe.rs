//! Probe Configuration
//!
//! Asset and appliance configuration maps as delivered by the monitoring
//! agent, with camelCase keys.

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::QueryResult;
use crate::types::{ApiVariant, TargetConfig, DEFAULT_BACKUP_MAX_AGE_DAYS};

/// Per-asset configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetConfig {
    /// Falls back to the asset name when absent or empty.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default, rename = "verifySSL")]
    pub verify_ssl: Option<bool>,
    /// Maximum backup age in days for the backups collector.
    #[serde(default)]
    pub backup_max_age: Option<u32>,
}

/// Appliance-level (local) configuration holding credentials.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
}

impl AssetConfig {
    pub fn backup_max_age_days(&self) -> u32 {
        self.backup_max_age.unwrap_or(DEFAULT_BACKUP_MAX_AGE_DAYS)
    }
}

impl std::fmt::Debug for LocalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConfig")
            .field("grant_type", &self.grant_type)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl TargetConfig {
    /// Resolve a target from probe configuration maps.
    pub fn from_probe_config(
        variant: ApiVariant,
        asset_name: &str,
        asset: &AssetConfig,
        local: &LocalConfig,
    ) -> QueryResult<TargetConfig> {
        let address = asset
            .address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(asset_name);

        let mut builder = TargetConfig::builder(variant)
            .address(address)
            .verify_ssl(asset.verify_ssl.unwrap_or(false));

        if let Some(port) = asset.port {
            builder = builder.port(port);
        }
        if let Some(version) = &asset.api_version {
            builder = builder.api_version(version.clone());
        }
        if let Some(grant_type) = &local.grant_type {
            builder = builder.grant_type(grant_type.clone());
        }
        if let Some(username) = &local.username {
            builder = builder.username(username.clone());
        }
        if let Some(password) = &local.password {
            builder = builder.password_secret(password.clone());
        }
        if let Some(client_id) = &local.client_id {
            builder = builder.client_id(client_id.clone());
        }
        if let Some(client_secret) = &local.client_secret {
            builder = builder.client_secret_secret(client_secret.clone());
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, QueryError};
    use serde_json::json;

    #[test]
    fn test_deserialize_camel_case_keys() {
        let asset: AssetConfig = serde_json::from_value(json!({
            "address": "veeam.local",
            "port": 9420,
            "apiVersion": "1.1-rev2",
            "verifySSL": true,
            "backupMaxAge": 3
        }))
        .unwrap();

        assert_eq!(asset.address.as_deref(), Some("veeam.local"));
        assert_eq!(asset.port, Some(9420));
        assert_eq!(asset.verify_ssl, Some(true));
        assert_eq!(asset.backup_max_age, Some(3));
        assert_eq!(asset.backup_max_age_days(), 3);
        assert_eq!(AssetConfig::default().backup_max_age_days(), 7);

        let local: LocalConfig = serde_json::from_value(json!({
            "username": "svc",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(local.username.as_deref(), Some("svc"));
        assert!(local.grant_type.is_none());
    }

    #[test]
    fn test_address_falls_back_to_asset_name() {
        let local = LocalConfig {
            username: Some("svc".to_string()),
            password: Some(SecretString::new("pw".to_string())),
            ..Default::default()
        };

        let target = TargetConfig::from_probe_config(
            ApiVariant::BackupReplication,
            "backup01.corp",
            &AssetConfig::default(),
            &local,
        )
        .unwrap();

        assert_eq!(target.api_url(), "https://backup01.corp:9419");
        assert!(!target.verify_ssl);
        assert_eq!(target.api_version.as_str(), "1.2-rev1");
    }

    #[test]
    fn test_missing_password_is_reported() {
        let local = LocalConfig {
            username: Some("svc".to_string()),
            ..Default::default()
        };

        let err = TargetConfig::from_probe_config(
            ApiVariant::BackupReplication,
            "backup01",
            &AssetConfig::default(),
            &local,
        )
        .unwrap_err();

        match err {
            QueryError::Configuration(ConfigurationError::MissingRequired { field }) => {
                assert_eq!(field, "password")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
