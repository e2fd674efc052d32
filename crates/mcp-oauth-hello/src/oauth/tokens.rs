//! Issued access/refresh tokens and the pre-seeded bootstrap table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::{Expiring, StaticToken, TokenRecord};
use crate::error::{OAuthError, OAuthResult};

/// Outcome of looking up a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Valid(T),
    /// Found but lapsed; the entry has been deleted.
    Expired,
    Missing,
}

/// Look up `key`, deleting it if it has expired.
fn lookup<R: Expiring + Clone>(
    map: &mut HashMap<String, R>,
    key: &str,
    now: DateTime<Utc>,
) -> Lookup<R> {
    let expired = match map.get(key) {
        Some(record) => record.is_expired(now),
        None => return Lookup::Missing,
    };

    if expired {
        map.remove(key);
        return Lookup::Expired;
    }
    map.get(key).cloned().map_or(Lookup::Missing, Lookup::Valid)
}

fn purge<R: Expiring>(map: &mut HashMap<String, R>, now: DateTime<Utc>) -> usize {
    let before = map.len();
    map.retain(|_, record| !record.is_expired(now));
    before - map.len()
}

/// Provider-issued tokens, keyed by access token.
#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenRecord>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: TokenRecord) {
        self.tokens.write().await.insert(record.access_token.clone(), record);
    }

    /// Look up an access token, deleting it if expired.
    pub async fn lookup(&self, access_token: &str, now: DateTime<Utc>) -> Lookup<TokenRecord> {
        lookup(&mut *self.tokens.write().await, access_token, now)
    }

    /// Replace the record holding `refresh_token` with one keyed by `new_access_token`.
    ///
    /// The refresh token value, subject, client and scope carry over; the old
    /// access token stops working immediately. Records are scanned linearly.
    pub async fn rotate_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        new_access_token: String,
        expires_at: DateTime<Utc>,
    ) -> OAuthResult<TokenRecord> {
        let mut tokens = self.tokens.write().await;

        let Some(old_key) = tokens
            .values()
            .find(|record| {
                record.refresh_token.as_deref() == Some(refresh_token)
                    && record.client_id == client_id
            })
            .map(|record| record.access_token.clone())
        else {
            return Err(OAuthError::invalid_grant("Invalid refresh token"));
        };

        let old = tokens
            .remove(&old_key)
            .ok_or_else(|| OAuthError::invalid_grant("Invalid refresh token"))?;

        let record = TokenRecord {
            access_token: new_access_token,
            refresh_token: old.refresh_token,
            user_id: old.user_id,
            client_id: old.client_id,
            scope: old.scope,
            expires_at,
        };
        tokens.insert(record.access_token.clone(), record.clone());
        Ok(record)
    }

    /// Drop every expired record. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        purge(&mut *self.tokens.write().await, now)
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish()
    }
}

/// Bearer tokens seeded at startup for bootstrap/demo access.
#[derive(Default)]
pub struct StaticTokenTable {
    tokens: RwLock<HashMap<String, StaticToken>>,
}

impl StaticTokenTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding a single entry.
    #[must_use]
    pub fn seeded(token: StaticToken) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.token.clone(), token);
        Self { tokens: RwLock::new(tokens) }
    }

    /// Look up a token, deleting it if expired.
    pub async fn lookup(&self, token: &str, now: DateTime<Utc>) -> Lookup<StaticToken> {
        lookup(&mut *self.tokens.write().await, token, now)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        purge(&mut *self.tokens.write().await, now)
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

impl std::fmt::Debug for StaticTokenTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenTable").finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn record(access: &str, refresh: &str, client_id: &str, expires_at: DateTime<Utc>) -> TokenRecord {
        TokenRecord {
            access_token: access.into(),
            refresh_token: Some(refresh.into()),
            user_id: "user-1".into(),
            client_id: client_id.into(),
            scope: "read write".into(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.insert(record("a1", "r1", "c1", now + TimeDelta::hours(1))).await;

        match store.lookup("a1", now).await {
            Lookup::Valid(found) => assert_eq!(found.client_id, "c1"),
            other => panic!("expected valid token, got {other:?}"),
        }
        assert_eq!(store.lookup("invalid", now).await, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_expired_token_deleted() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.insert(record("a1", "r1", "c1", now)).await;

        let later = now + TimeDelta::seconds(1);
        assert_eq!(store.lookup("a1", later).await, Lookup::Expired);
        assert_eq!(store.lookup("a1", later).await, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_rotate_keeps_refresh_token() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.insert(record("a1", "r1", "c1", now + TimeDelta::hours(1))).await;

        let rotated = store
            .rotate_access_token("r1", "c1", "a2".into(), now + TimeDelta::hours(1))
            .await
            .unwrap();
        assert_eq!(rotated.refresh_token.as_deref(), Some("r1"));
        assert_eq!(rotated.scope, "read write");

        assert_eq!(store.lookup("a1", now).await, Lookup::Missing);
        assert!(matches!(store.lookup("a2", now).await, Lookup::Valid(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rotate_rejects_foreign_client() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.insert(record("a1", "r1", "c1", now + TimeDelta::hours(1))).await;

        let err = store
            .rotate_access_token("r1", "c2", "a2".into(), now)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_grant");
        assert!(matches!(store.lookup("a1", now).await, Lookup::Valid(_)));
    }

    #[tokio::test]
    async fn test_static_table() {
        let now = Utc::now();
        let table = StaticTokenTable::seeded(StaticToken {
            token: "dev".into(),
            user_id: "user-1".into(),
            scope: "read write".into(),
            expires_at: now + TimeDelta::hours(1),
        });

        assert!(matches!(table.lookup("dev", now).await, Lookup::Valid(_)));
        assert_eq!(table.purge_expired(now + TimeDelta::hours(2)).await, 1);
        assert!(table.is_empty().await);
    }
}
