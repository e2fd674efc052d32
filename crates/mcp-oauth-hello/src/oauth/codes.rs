//! Single-use authorization codes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::pkce::PkceChallenge;
use super::types::{AuthorizationCode, Expiring};
use crate::error::{OAuthError, OAuthResult};

/// In-memory authorization code store.
///
/// Every check-then-delete runs under one write guard, so a code can be
/// redeemed at most once even under concurrent token requests.
#[derive(Default)]
pub struct AuthorizationCodeStore {
    codes: RwLock<HashMap<String, AuthorizationCode>>,
}

impl AuthorizationCodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: AuthorizationCode) {
        self.codes.write().await.insert(record.code.clone(), record);
    }

    /// Remove and return a code that exists, belongs to `client_id` and has not expired.
    ///
    /// An expired code is deleted on this access. A code held by another
    /// client is left in place.
    pub async fn redeem(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> OAuthResult<AuthorizationCode> {
        let mut codes = self.codes.write().await;
        check(&mut codes, code, client_id, now)?;
        codes.remove(code).ok_or_else(|| OAuthError::invalid_grant("Invalid authorization code"))
    }

    /// The PKCE challenge bound to a live code, without consuming it.
    pub async fn challenge(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> OAuthResult<Option<PkceChallenge>> {
        let mut codes = self.codes.write().await;
        check(&mut codes, code, client_id, now)?;
        Ok(codes.get(code).and_then(|record| record.code_challenge.clone()))
    }

    /// Drop every expired code. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, record| !record.is_expired(now));
        before - codes.len()
    }

    pub async fn len(&self) -> usize {
        self.codes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.codes.read().await.is_empty()
    }
}

fn check(
    codes: &mut HashMap<String, AuthorizationCode>,
    code: &str,
    client_id: &str,
    now: DateTime<Utc>,
) -> OAuthResult<()> {
    let expired = match codes.get(code) {
        Some(record) if record.client_id == client_id => record.is_expired(now),
        _ => return Err(OAuthError::invalid_grant("Invalid authorization code")),
    };

    if expired {
        codes.remove(code);
        return Err(OAuthError::invalid_grant("Authorization code expired"));
    }
    Ok(())
}

impl std::fmt::Debug for AuthorizationCodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCodeStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn record(code: &str, client_id: &str, expires_at: DateTime<Utc>) -> AuthorizationCode {
        AuthorizationCode {
            code: code.into(),
            client_id: client_id.into(),
            user_id: "user-1".into(),
            scope: "read".into(),
            redirect_uri: "https://cb/".into(),
            code_challenge: Some(PkceChallenge::s256("challenge")),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_redeem_once() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        store.insert(record("abc", "c1", now + TimeDelta::minutes(5))).await;

        let redeemed = store.redeem("abc", "c1", now).await.unwrap();
        assert_eq!(redeemed.user_id, "user-1");

        let again = store.redeem("abc", "c1", now).await;
        assert_eq!(again.unwrap_err().error_code(), "invalid_grant");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_foreign_client_leaves_code() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        store.insert(record("abc", "c1", now + TimeDelta::minutes(5))).await;

        assert!(store.redeem("abc", "c2", now).await.is_err());
        assert_eq!(store.len().await, 1);
        assert!(store.redeem("abc", "c1", now).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_code_deleted_on_access() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        store.insert(record("abc", "c1", now)).await;

        let later = now + TimeDelta::seconds(1);
        let err = store.challenge("abc", "c1", later).await.unwrap_err();
        assert_eq!(err, OAuthError::invalid_grant("Authorization code expired"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_challenge_does_not_consume() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        store.insert(record("abc", "c1", now + TimeDelta::minutes(5))).await;

        let challenge = store.challenge("abc", "c1", now).await.unwrap();
        assert_eq!(challenge, Some(PkceChallenge::s256("challenge")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        store.insert(record("old", "c1", now - TimeDelta::seconds(1))).await;
        store.insert(record("new", "c1", now + TimeDelta::minutes(5))).await;

        assert_eq!(store.purge_expired(now).await, 1);
        assert_eq!(store.len().await, 1);
    }
}
