//! Token Cache
//!
//! In-memory token store shared by every client in the process.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::types::{CachedToken, CredentialIdentity};

pub(crate) type CacheEntries = HashMap<CredentialIdentity, CachedToken>;

/// Process-wide token cache keyed by credential identity.
///
/// A single lock guards every entry. The token provider holds it for the
/// lookup and, when needed, for the token exchange itself, so concurrent
/// exchanges are serialized across all identities. Entries are replaced on
/// every exchange and never removed.
#[derive(Default)]
pub struct TokenCache {
    entries: Mutex<CacheEntries>,
}

impl TokenCache {
    /// Create new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new empty cache ready to be shared between clients.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Get a copy of the entry for an identity.
    pub async fn get(&self, identity: &CredentialIdentity) -> Option<CachedToken> {
        self.entries.lock().await.get(identity).cloned()
    }

    /// Replace the entry for an identity.
    pub async fn insert(&self, identity: CredentialIdentity, token: CachedToken) {
        self.entries.lock().await.insert(identity, token);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Take the cache lock.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, CacheEntries> {
        self.entries.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use secrecy::{ExposeSecret, SecretString};

    fn identity(user: &str) -> CredentialIdentity {
        CredentialIdentity {
            api_url: "https://veeam.local:9419".to_string(),
            api_version: "1.2-rev1".to_string(),
            username: user.to_string(),
            client_id: None,
        }
    }

    fn token(value: &str) -> CachedToken {
        CachedToken {
            access_token: SecretString::new(value.to_string()),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = TokenCache::new();
        assert!(cache.is_empty().await);

        cache.insert(identity("svc"), token("first")).await;
        let stored = cache.get(&identity("svc")).await.unwrap();
        assert_eq!(stored.access_token.expose_secret(), "first");
        assert!(cache.get(&identity("other")).await.is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_entry() {
        let cache = TokenCache::new();
        cache.insert(identity("svc"), token("first")).await;
        cache.insert(identity("svc"), token("second")).await;

        assert_eq!(cache.len().await, 1);
        let stored = cache.get(&identity("svc")).await.unwrap();
        assert_eq!(stored.access_token.expose_secret(), "second");
    }

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let a = TokenCache::shared();
        let b = TokenCache::shared();
        a.insert(identity("svc"), token("only-in-a")).await;

        assert_eq!(a.len().await, 1);
        assert!(b.is_empty().await);
    }
}
