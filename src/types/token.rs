//! Token Types
//!
//! Token exchange responses, cached tokens and cache keys.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Identifies the scope a token was issued for.
///
/// Two targets with equal identities share one cached token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialIdentity {
    /// Scheme, host and port of the API.
    pub api_url: String,
    pub api_version: String,
    pub username: String,
    /// Client identifier, for variants that use one.
    pub client_id: Option<String>,
}

/// Token response from the token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Token held in the cache for one identity.
#[derive(Clone, Debug)]
pub struct CachedToken {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Already reduced by the expiry margin.
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Build a cache entry from a token response issued at `issued_at`.
    ///
    /// Returns `None` when `expires_in` does not fit a representable expiry
    /// instant.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>, margin: Duration) -> Option<Self> {
        let lifetime = i64::try_from(response.expires_in)
            .ok()
            .and_then(chrono::Duration::try_seconds)?;
        let margin = chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::zero());
        let expires_at = issued_at
            .checked_add_signed(lifetime)?
            .checked_sub_signed(margin)?;

        Some(Self {
            access_token: SecretString::new(response.access_token),
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::new),
            expires_at,
        })
    }

    /// Entry that forces a password grant on next use.
    pub fn invalidated(access_token: SecretString) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Access token handed to the executor.
#[derive(Clone)]
pub struct IssuedToken {
    value: SecretString,
    /// Issued by an exchange during this call rather than read from cache.
    pub fresh: bool,
}

impl IssuedToken {
    pub fn new(value: SecretString, fresh: bool) -> Self {
        Self { value, fresh }
    }

    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("value", &"[REDACTED]")
            .field("fresh", &self.fresh)
            .finish()
    }
}
