//! OAuth 2.1 authorization server core.
//!
//! Transport-independent: the HTTP layer in [`crate::server`] routes
//! `/authorize`, `/token` and `/register` here, and protected handlers
//! call a [`BearerVerifier`] before doing any work.
//!
//! ## Flow
//! 1. [`OAuthProvider::register_client`] (RFC 7591)
//! 2. [`OAuthProvider::authorize`] issues a 5-minute single-use code
//! 3. [`OAuthProvider::exchange_authorization_code`] trades it for a 1-hour
//!    access token and a refresh token (PKCE checked when a challenge was recorded)
//! 4. [`OAuthProvider::exchange_refresh_token`] replaces the access token
//! 5. [`OAuthProvider::verify_access_token`] resolves bearer tokens

pub mod clients;
pub mod clock;
pub mod codes;
pub mod pkce;
pub mod provider;
pub mod random;
pub mod scope;
pub mod tokens;
pub mod types;
pub mod verifier;

pub use clients::ClientRegistry;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::AuthorizationCodeStore;
pub use pkce::{PkceChallenge, PkceMethod};
pub use provider::{OAuthProvider, ProviderSettings};
pub use tokens::{Lookup, StaticTokenTable, TokenStore};
pub use types::{
    AuthInfo, AuthorizationCode, AuthorizationParams, Client, ClientMetadata, StaticToken,
    TokenRecord, TokenResponse,
};
pub use verifier::BearerVerifier;
