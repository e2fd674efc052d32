//! Bearer token verification for resource servers.
//!
//! Tokens issued by the provider are checked first, then the pre-seeded
//! bootstrap table, so a hard-coded development token keeps working next to
//! dynamically issued ones.

use async_trait::async_trait;

use super::provider::OAuthProvider;
use super::scope;
use super::tokens::Lookup;
use super::types::AuthInfo;
use crate::config::oauth::DEV_CLIENT_ID;
use crate::error::{OAuthError, OAuthResult};

/// Verifies bearer tokens presented to protected resources.
#[async_trait]
pub trait BearerVerifier: Send + Sync {
    /// Resolve a token to the identity and scopes it grants.
    async fn verify(&self, token: &str) -> OAuthResult<AuthInfo>;
}

impl OAuthProvider {
    /// Verify an access token against issued tokens, then the bootstrap table.
    ///
    /// Expired entries in either source are deleted on this access.
    pub async fn verify_access_token(&self, token: &str) -> OAuthResult<AuthInfo> {
        let now = self.clock.now();

        match self.tokens.lookup(token, now).await {
            Lookup::Valid(record) => {
                return Ok(AuthInfo {
                    token: token.to_string(),
                    client_id: record.client_id,
                    scopes: scope::split(&record.scope),
                    expires_at: record.expires_at.timestamp(),
                    subject: record.user_id,
                });
            }
            Lookup::Expired => return Err(OAuthError::invalid_token("Access token expired")),
            Lookup::Missing => {}
        }

        match self.static_tokens.lookup(token, now).await {
            Lookup::Valid(record) => {
                tracing::debug!("Accepted bootstrap token");
                Ok(AuthInfo {
                    token: token.to_string(),
                    client_id: DEV_CLIENT_ID.to_string(),
                    scopes: scope::split(&record.scope),
                    expires_at: record.expires_at.timestamp(),
                    subject: record.user_id,
                })
            }
            Lookup::Expired => Err(OAuthError::invalid_token("Access token expired")),
            Lookup::Missing => Err(OAuthError::invalid_token("Invalid access token")),
        }
    }
}

#[async_trait]
impl BearerVerifier for OAuthProvider {
    async fn verify(&self, token: &str) -> OAuthResult<AuthInfo> {
        self.verify_access_token(token).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::oauth::clock::ManualClock;

    #[tokio::test]
    async fn test_bootstrap_token() {
        let provider = OAuthProvider::new(&Config::default());
        let info = provider.verify("dev-token-12345").await.unwrap();

        assert_eq!(info.subject, "user-1");
        assert_eq!(info.client_id, "dev-client");
        assert_eq!(info.scopes, vec!["read", "write"]);
    }

    #[tokio::test]
    async fn test_bootstrap_token_disabled() {
        let mut config = Config::default();
        config.dev_token = None;
        let provider = OAuthProvider::new(&config);

        let err = provider.verify("dev-token-12345").await.unwrap_err();
        assert_eq!(err, OAuthError::invalid_token("Invalid access token"));
    }

    #[tokio::test]
    async fn test_bootstrap_token_expires() {
        let clock = Arc::new(ManualClock::default());
        let provider = OAuthProvider::with_clock(&Config::default(), clock.clone());

        clock.advance(Duration::from_secs(3601));
        let err = provider.verify("dev-token-12345").await.unwrap_err();
        assert_eq!(err, OAuthError::invalid_token("Access token expired"));
        assert!(provider.static_tokens().is_empty().await);

        let err = provider.verify("dev-token-12345").await.unwrap_err();
        assert_eq!(err, OAuthError::invalid_token("Invalid access token"));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let provider = OAuthProvider::new(&Config::default());
        let err = provider.verify("nope").await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_token");
    }
}
