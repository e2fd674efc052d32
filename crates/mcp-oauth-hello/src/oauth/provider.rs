//! The authorization-server state machine: authorize, exchange, refresh.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::clients::ClientRegistry;
use super::clock::{Clock, SystemClock, expiry_after};
use super::codes::AuthorizationCodeStore;
use super::pkce::PkceChallenge;
use super::random;
use super::scope;
use super::tokens::{StaticTokenTable, TokenStore};
use super::types::{
    AuthorizationCode, AuthorizationParams, Client, ClientMetadata, StaticToken, TokenRecord,
    TokenResponse,
};
use crate::config::{Config, oauth};
use crate::error::{OAuthError, OAuthResult};

/// Lifetimes and fixed values the provider stamps onto records.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub auth_code_ttl: Duration,
    pub access_token_ttl: Duration,
    pub default_scope: String,
    pub subject: String,
}

impl From<&Config> for ProviderSettings {
    fn from(config: &Config) -> Self {
        Self {
            auth_code_ttl: config.auth_code_ttl,
            access_token_ttl: config.access_token_ttl,
            default_scope: config.default_scope.clone(),
            subject: config.subject.clone(),
        }
    }
}

/// In-memory OAuth 2.1 authorization server.
///
/// Owns every store; construct one per server instance and share it behind an `Arc`.
pub struct OAuthProvider {
    pub(super) clients: ClientRegistry,
    pub(super) codes: AuthorizationCodeStore,
    pub(super) tokens: TokenStore,
    pub(super) static_tokens: StaticTokenTable,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: ProviderSettings,
}

impl OAuthProvider {
    /// Create a provider on the system clock.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a provider on the given clock.
    ///
    /// The bootstrap token, if configured, is seeded with a lifetime counted
    /// from the clock's current instant.
    #[must_use]
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let static_tokens = match config.dev_token.as_deref() {
            Some(token) => StaticTokenTable::seeded(StaticToken {
                token: token.to_string(),
                user_id: config.subject.clone(),
                scope: oauth::DEV_TOKEN_SCOPE.to_string(),
                expires_at: expiry_after(clock.now(), oauth::DEV_TOKEN_TTL),
            }),
            None => StaticTokenTable::new(),
        };

        Self {
            clients: ClientRegistry::new(),
            codes: AuthorizationCodeStore::new(),
            tokens: TokenStore::new(),
            static_tokens,
            clock,
            settings: ProviderSettings::from(config),
        }
    }

    #[must_use]
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    #[must_use]
    pub fn codes(&self) -> &AuthorizationCodeStore {
        &self.codes
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn static_tokens(&self) -> &StaticTokenTable {
        &self.static_tokens
    }

    #[must_use]
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Register a new OAuth client (Dynamic Client Registration).
    pub async fn register_client(&self, metadata: ClientMetadata) -> Client {
        let client = self.clients.register(metadata, self.clock.now()).await;
        tracing::info!(client_id = %client.client_id, "Registered OAuth client");
        client
    }

    /// Look up a registered client.
    pub async fn client(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).await
    }

    /// Authenticate a client at the token endpoint.
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> OAuthResult<Client> {
        self.clients.authenticate(client_id, client_secret, self.clock.now()).await
    }

    /// Issue an authorization code and return the redirect target carrying it.
    ///
    /// Consent is auto-granted to the configured subject. The client and
    /// redirect URI are expected to have been validated by the caller.
    pub async fn authorize(&self, client: &Client, params: AuthorizationParams) -> OAuthResult<Url> {
        let mut location = Url::parse(&params.redirect_uri).map_err(|e| {
            OAuthError::invalid_request(format!("redirect_uri is not a valid URL: {e}"))
        })?;

        let now = self.clock.now();
        let code = random::secret();
        let scope = scope::normalize(params.scope.as_deref(), &self.settings.default_scope);

        self.codes
            .insert(AuthorizationCode {
                code: code.clone(),
                client_id: client.client_id.clone(),
                user_id: self.settings.subject.clone(),
                scope: scope.clone(),
                redirect_uri: params.redirect_uri,
                code_challenge: params.code_challenge,
                expires_at: expiry_after(now, self.settings.auth_code_ttl),
            })
            .await;

        {
            let mut query = location.query_pairs_mut();
            query.append_pair("code", &code);
            if let Some(state) = params.state.as_deref().filter(|s| !s.is_empty()) {
                query.append_pair("state", state);
            }
        }

        tracing::info!(client_id = %client.client_id, scope = %scope, "Issued authorization code");
        Ok(location)
    }

    /// The PKCE challenge recorded when `code` was issued.
    ///
    /// `None` means the authorization request carried no challenge.
    pub async fn challenge_for_authorization_code(
        &self,
        client: &Client,
        code: &str,
    ) -> OAuthResult<Option<PkceChallenge>> {
        self.codes.challenge(code, &client.client_id, self.clock.now()).await
    }

    /// Redeem an authorization code for an access/refresh token pair.
    ///
    /// The code is consumed before any further check, so a failed PKCE or
    /// redirect URI comparison still burns it.
    pub async fn exchange_authorization_code(
        &self,
        client: &Client,
        code: &str,
        code_verifier: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        let now = self.clock.now();
        let record = self.codes.redeem(code, &client.client_id, now).await.inspect_err(|e| {
            tracing::warn!(client_id = %client.client_id, error = %e, "Rejected authorization code");
        })?;

        if let Some(redirect_uri) = redirect_uri {
            if redirect_uri != record.redirect_uri {
                return Err(OAuthError::invalid_grant("redirect_uri mismatch"));
            }
        }

        if let Some(challenge) = &record.code_challenge {
            let verified = code_verifier.is_some_and(|verifier| challenge.verify(verifier));
            if !verified {
                tracing::warn!(client_id = %client.client_id, "PKCE verification failed");
                return Err(OAuthError::invalid_grant("PKCE verification failed"));
            }
        }

        let refresh_token = random::secret();
        let token = TokenRecord {
            access_token: random::secret(),
            refresh_token: Some(refresh_token),
            user_id: record.user_id,
            client_id: record.client_id,
            scope: record.scope,
            expires_at: expiry_after(now, self.settings.access_token_ttl),
        };
        let response = self.token_response(&token);
        self.tokens.insert(token).await;

        tracing::info!(client_id = %client.client_id, "Issued token pair");
        Ok(response)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is returned unchanged and stays valid.
    pub async fn exchange_refresh_token(
        &self,
        client: &Client,
        refresh_token: &str,
    ) -> OAuthResult<TokenResponse> {
        let now = self.clock.now();
        let token = self
            .tokens
            .rotate_access_token(
                refresh_token,
                &client.client_id,
                random::secret(),
                expiry_after(now, self.settings.access_token_ttl),
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(client_id = %client.client_id, error = %e, "Rejected refresh token");
            })?;

        tracing::info!(client_id = %client.client_id, "Refreshed access token");
        Ok(self.token_response(&token))
    }

    /// Remove every expired code and token. Returns how many entries were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.codes.purge_expired(now).await
            + self.tokens.purge_expired(now).await
            + self.static_tokens.purge_expired(now).await
    }

    /// Start a background task that calls [`Self::purge_expired`] every `interval`.
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = self.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(count = removed, "Cleaned up expired OAuth entries");
                }
            }
        });
    }

    fn token_response(&self, token: &TokenRecord) -> TokenResponse {
        TokenResponse {
            access_token: token.access_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: self.settings.access_token_ttl.as_secs(),
            refresh_token: token.refresh_token.clone(),
            scope: token.scope.clone(),
        }
    }
}

impl std::fmt::Debug for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProvider").field("settings", &self.settings).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::clock::ManualClock;
    use super::super::pkce::s256_challenge;
    use super::*;

    fn provider() -> (OAuthProvider, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let provider = OAuthProvider::with_clock(&Config::default(), clock.clone());
        (provider, clock)
    }

    async fn register(provider: &OAuthProvider) -> Client {
        provider
            .register_client(ClientMetadata {
                redirect_uris: vec!["https://cb/".into()],
                ..ClientMetadata::default()
            })
            .await
    }

    fn code_from(location: &Url) -> String {
        location
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorize_redirect_shape() {
        let (provider, _) = provider();
        let client = register(&provider).await;

        let location = provider
            .authorize(
                &client,
                AuthorizationParams {
                    redirect_uri: "https://cb/".into(),
                    scope: Some("read write".into()),
                    state: Some("xyz".into()),
                    code_challenge: None,
                },
            )
            .await
            .unwrap();

        let code = code_from(&location);
        assert_eq!(code.len(), 64);
        assert_eq!(location.as_str(), format!("https://cb/?code={code}&state=xyz"));
    }

    #[tokio::test]
    async fn test_authorize_rejects_unparseable_redirect() {
        let (provider, _) = provider();
        let client = register(&provider).await;

        let err = provider
            .authorize(
                &client,
                AuthorizationParams { redirect_uri: "not a url".into(), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_request");
        assert!(provider.codes().is_empty().await);
    }

    #[tokio::test]
    async fn test_pkce_enforced_on_exchange() {
        let (provider, _) = provider();
        let client = register(&provider).await;
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

        let location = provider
            .authorize(
                &client,
                AuthorizationParams {
                    redirect_uri: "https://cb/".into(),
                    code_challenge: Some(PkceChallenge::s256(s256_challenge(verifier))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let code = code_from(&location);

        let challenge = provider.challenge_for_authorization_code(&client, &code).await.unwrap();
        assert_eq!(challenge.map(|c| c.challenge), Some(s256_challenge(verifier)));

        let tokens = provider
            .exchange_authorization_code(&client, &code, Some(verifier), Some("https://cb/"))
            .await
            .unwrap();
        assert_eq!(tokens.scope, "read");
    }

    #[tokio::test]
    async fn test_wrong_verifier_burns_code() {
        let (provider, _) = provider();
        let client = register(&provider).await;

        let location = provider
            .authorize(
                &client,
                AuthorizationParams {
                    redirect_uri: "https://cb/".into(),
                    code_challenge: Some(PkceChallenge::s256(s256_challenge("right"))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let code = code_from(&location);

        let err = provider
            .exchange_authorization_code(&client, &code, Some("wrong"), None)
            .await
            .unwrap_err();
        assert_eq!(err, OAuthError::invalid_grant("PKCE verification failed"));

        let err = provider
            .exchange_authorization_code(&client, &code, Some("right"), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_grant");
    }

    #[tokio::test]
    async fn test_redirect_uri_mismatch() {
        let (provider, _) = provider();
        let client = register(&provider).await;

        let location = provider
            .authorize(
                &client,
                AuthorizationParams { redirect_uri: "https://cb/".into(), ..Default::default() },
            )
            .await
            .unwrap();

        let err = provider
            .exchange_authorization_code(&client, &code_from(&location), None, Some("https://evil/"))
            .await
            .unwrap_err();
        assert_eq!(err, OAuthError::invalid_grant("redirect_uri mismatch"));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (provider, clock) = provider();
        let client = register(&provider).await;

        provider
            .authorize(
                &client,
                AuthorizationParams { redirect_uri: "https://cb/".into(), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(provider.purge_expired().await, 0);

        // Past the code TTL and the bootstrap token's lifetime.
        clock.advance(Duration::from_secs(2 * 3600));
        assert_eq!(provider.purge_expired().await, 2);
        assert!(provider.codes().is_empty().await);
        assert!(provider.static_tokens().is_empty().await);
    }
}
