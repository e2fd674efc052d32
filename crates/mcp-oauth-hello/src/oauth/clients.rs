//! Dynamically registered clients (RFC 7591).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::pkce::constant_time_eq;
use super::random;
use super::types::{Client, ClientMetadata};
use crate::config::oauth::DEFAULT_TOKEN_ENDPOINT_AUTH_METHOD;
use crate::error::{OAuthError, OAuthResult};

/// In-memory client registry.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Client>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. Always succeeds; metadata is validated by the caller.
    pub async fn register(&self, metadata: ClientMetadata, now: DateTime<Utc>) -> Client {
        let grant_types = if metadata.grant_types.is_empty() {
            vec!["authorization_code".to_string(), "refresh_token".to_string()]
        } else {
            metadata.grant_types
        };
        let response_types = if metadata.response_types.is_empty() {
            vec!["code".to_string()]
        } else {
            metadata.response_types
        };

        let client = Client {
            client_id: random::client_id(),
            client_secret: random::secret(),
            client_name: metadata.client_name,
            redirect_uris: metadata.redirect_uris,
            token_endpoint_auth_method: metadata
                .token_endpoint_auth_method
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT_AUTH_METHOD.to_string()),
            grant_types,
            response_types,
            scope: metadata.scope,
            issued_at: now.timestamp(),
            secret_expires_at: 0,
        };

        self.clients.write().await.insert(client.client_id.clone(), client.clone());
        client
    }

    /// Look up a client by ID.
    pub async fn get(&self, client_id: &str) -> Option<Client> {
        self.clients.read().await.get(client_id).cloned()
    }

    /// Authenticate a client at the token endpoint.
    ///
    /// Public clients (`token_endpoint_auth_method = "none"`) need only their id.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
        now: DateTime<Utc>,
    ) -> OAuthResult<Client> {
        let Some(client) = self.get(client_id).await else {
            return Err(OAuthError::invalid_client("Unknown client_id"));
        };

        if client.is_public() {
            return Ok(client);
        }

        let Some(secret) = client_secret else {
            return Err(OAuthError::invalid_client("Client secret is required"));
        };
        if !constant_time_eq(secret.as_bytes(), client.client_secret.as_bytes()) {
            return Err(OAuthError::invalid_client("Invalid client_secret"));
        }
        if client.secret_expired(now) {
            return Err(OAuthError::invalid_client("Client secret has expired"));
        }

        Ok(client)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish()
    }
}
