//! OAuth 2.1 record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pkce::PkceChallenge;

/// Registration metadata submitted by a client (RFC 7591 §2).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientMetadata {
    pub client_name: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
    pub scope: Option<String>,
}

/// A dynamically registered OAuth client. Immutable once issued.
///
/// Serializes as the RFC 7591 registration response.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Client {
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Unix seconds.
    #[serde(rename = "client_id_issued_at")]
    pub issued_at: i64,
    /// Unix seconds, 0 = never.
    #[serde(rename = "client_secret_expires_at")]
    pub secret_expires_at: i64,
}

impl Client {
    /// Whether the client secret has lapsed.
    #[must_use]
    pub fn secret_expired(&self, now: DateTime<Utc>) -> bool {
        self.secret_expires_at != 0 && now.timestamp() > self.secret_expires_at
    }

    /// Whether `uri` is one of the registered redirect URIs.
    #[must_use]
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|registered| registered == uri)
    }

    /// Whether the client authenticates with its id alone.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.token_endpoint_auth_method == "none"
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("client_name", &self.client_name)
            .field("redirect_uris", &self.redirect_uris)
            .field("token_endpoint_auth_method", &self.token_endpoint_auth_method)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Parameters of an approved authorization request.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationParams {
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<PkceChallenge>,
}

/// A single-use authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub redirect_uri: String,
    pub code_challenge: Option<PkceChallenge>,
    pub expires_at: DateTime<Utc>,
}

/// An issued access token and the refresh token that renews it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub client_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

/// A pre-seeded bearer token with no client binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

/// Records that lapse at a fixed instant.
pub trait Expiring {
    fn expires_at(&self) -> DateTime<Utc>;

    /// A record is still valid at exactly its expiry instant.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }
}

impl Expiring for AuthorizationCode {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Expiring for TokenRecord {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Expiring for StaticToken {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Token endpoint success body (RFC 6749 §5.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

/// Result of verifying a bearer token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthInfo {
    pub token: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Unix seconds.
    pub expires_at: i64,
    pub subject: String,
}

impl AuthInfo {
    /// Whether the token grants `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
