//! OAuth 2.1 endpoint handlers.
//!
//! Implements:
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code and Refresh Token Grants

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use serde::Deserialize;
use url::Url;

use crate::config::oauth::SUPPORTED_SCOPES;
use crate::error::OAuthError;
use crate::oauth::{
    AuthorizationParams, Client, ClientMetadata, OAuthProvider, PkceChallenge, PkceMethod,
    TokenResponse, scope,
};
use crate::server::transport::HttpState;

/// Token endpoint auth methods accepted at registration.
const AUTH_METHODS: &[&str] = &["client_secret_post", "client_secret_basic", "none"];

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status =
            if self.is_unauthorized() { StatusCode::UNAUTHORIZED } else { StatusCode::BAD_REQUEST };
        error_body(status, &self)
    }
}

fn error_body(status: StatusCode, err: &OAuthError) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": err.error_code(),
            "error_description": err.description()
        })),
    )
        .into_response()
}

// ─── RFC 9728: Protected Resource Metadata ───────────────────────────────────

/// `GET /.well-known/oauth-protected-resource`
///
/// Tells clients where to find the authorization server for this resource.
pub async fn handle_protected_resource(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "resource": state.base_url,
        "authorization_servers": [state.base_url],
        "bearer_methods_supported": ["header"],
        "scopes_supported": SUPPORTED_SCOPES
    }))
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities.
pub async fn handle_auth_server_metadata(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "issuer": state.base_url,
        "authorization_endpoint": format!("{}/authorize", state.base_url),
        "token_endpoint": format!("{}/token", state.base_url),
        "registration_endpoint": format!("{}/register", state.base_url),
        "scopes_supported": SUPPORTED_SCOPES,
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "token_endpoint_auth_methods_supported": AUTH_METHODS,
        "code_challenge_methods_supported": [PkceMethod::S256.as_str()]
    }))
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

/// `POST /register`
///
/// Register a new OAuth client dynamically.
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    Json(metadata): Json<ClientMetadata>,
) -> Response {
    if let Err(err) = validate_metadata(&metadata) {
        return err.into_response();
    }

    let client = state.provider.register_client(metadata).await;
    (StatusCode::CREATED, Json(client)).into_response()
}

fn validate_metadata(metadata: &ClientMetadata) -> Result<(), OAuthError> {
    if metadata.redirect_uris.is_empty() {
        return Err(OAuthError::invalid_client_metadata("redirect_uris is required"));
    }
    for uri in &metadata.redirect_uris {
        let Ok(parsed) = Url::parse(uri) else {
            return Err(OAuthError::invalid_client_metadata(format!(
                "redirect_uri '{uri}' is not a valid URL"
            )));
        };
        // RFC 6749 section 3.1.2: the redirection endpoint must not carry a fragment.
        if parsed.fragment().is_some() {
            return Err(OAuthError::invalid_client_metadata(format!(
                "redirect_uri '{uri}' must not contain a fragment"
            )));
        }
    }
    if let Some(method) = metadata.token_endpoint_auth_method.as_deref() {
        if !AUTH_METHODS.contains(&method) {
            return Err(OAuthError::invalid_client_metadata(format!(
                "token_endpoint_auth_method '{method}' is not supported"
            )));
        }
    }
    if let Some(unsupported) =
        metadata.scope.as_deref().and_then(|s| scope::first_unsupported(s, SUPPORTED_SCOPES))
    {
        return Err(OAuthError::invalid_client_metadata(format!(
            "scope '{unsupported}' is not supported"
        )));
    }
    Ok(())
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub scope: Option<String>,
}

/// `GET /authorize`
///
/// Auto-approves the request for the demo subject; there is no consent page.
pub async fn handle_authorize_get(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    authorize(&state.provider, query).await
}

/// `POST /authorize`
pub async fn handle_authorize_post(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<AuthorizeQuery>,
) -> Response {
    authorize(&state.provider, form).await
}

async fn authorize(provider: &OAuthProvider, query: AuthorizeQuery) -> Response {
    // Until the redirect URI is trusted, errors are rendered, never redirected.
    let Some(client_id) = query.client_id.as_deref() else {
        return error_body(StatusCode::BAD_REQUEST, &OAuthError::invalid_request("Missing client_id"));
    };
    let Some(client) = provider.client(client_id).await else {
        return error_body(StatusCode::BAD_REQUEST, &OAuthError::invalid_client("Unknown client_id"));
    };
    let redirect_uri = match resolve_redirect_uri(&client, query.redirect_uri.as_deref()) {
        Ok(uri) => uri,
        Err(err) => return error_body(StatusCode::BAD_REQUEST, &err),
    };

    let params = match authorization_params(&query, redirect_uri.clone()) {
        Ok(params) => params,
        Err(err) => return redirect_error(&redirect_uri, &err, query.state.as_deref()),
    };

    match provider.authorize(&client, params).await {
        Ok(location) => {
            tracing::info!(client_id = %client.client_id, "Auto-approved authorization");
            redirect(location.as_str())
        }
        Err(err) => error_body(StatusCode::BAD_REQUEST, &err),
    }
}

fn resolve_redirect_uri(client: &Client, requested: Option<&str>) -> Result<String, OAuthError> {
    match requested {
        Some(uri) if client.has_redirect_uri(uri) => Ok(uri.to_string()),
        Some(_) => Err(OAuthError::invalid_request("redirect_uri not registered for this client")),
        None => match client.redirect_uris.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(OAuthError::invalid_request("Missing redirect_uri")),
        },
    }
}

fn authorization_params(
    query: &AuthorizeQuery,
    redirect_uri: String,
) -> Result<AuthorizationParams, OAuthError> {
    let response_type = query.response_type.as_deref().unwrap_or_default();
    if response_type != "code" {
        return Err(OAuthError::UnsupportedResponseType {
            response_type: response_type.to_string(),
        });
    }

    let Some(challenge) = query.code_challenge.as_deref().filter(|c| !c.is_empty()) else {
        return Err(OAuthError::invalid_request("Missing code_challenge"));
    };
    if PkceMethod::parse(query.code_challenge_method.as_deref()) != Some(PkceMethod::S256) {
        return Err(OAuthError::invalid_request("code_challenge_method must be 'S256'"));
    }

    if let Some(unsupported) =
        query.scope.as_deref().and_then(|s| scope::first_unsupported(s, SUPPORTED_SCOPES))
    {
        return Err(OAuthError::invalid_scope(format!("scope '{unsupported}' is not supported")));
    }

    Ok(AuthorizationParams {
        redirect_uri,
        scope: query.scope.clone(),
        state: query.state.clone(),
        code_challenge: Some(PkceChallenge::s256(challenge)),
    })
}

/// Report an authorization error to the client's redirect URI (RFC 6749 §4.1.2.1).
fn redirect_error(redirect_uri: &str, err: &OAuthError, state: Option<&str>) -> Response {
    let Ok(mut location) = Url::parse(redirect_uri) else {
        return error_body(StatusCode::BAD_REQUEST, err);
    };
    {
        let mut query = location.query_pairs_mut();
        query.append_pair("error", err.error_code());
        query.append_pair("error_description", &err.description());
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            query.append_pair("state", state);
        }
    }
    redirect(location.as_str())
}

fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

/// `POST /token`
///
/// Exchange authorization code for tokens, or refresh tokens.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Form(form): Form<TokenRequest>,
) -> Response {
    let provider = &state.provider;

    let client = match authenticate(provider, &headers, &form).await {
        Ok(client) => client,
        Err(err) => return err.into_response(),
    };

    let result = match form.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(provider, &client, &form).await,
        "refresh_token" => refresh_token_grant(provider, &client, &form).await,
        other => Err(OAuthError::UnsupportedGrantType { grant_type: other.to_string() }),
    };

    match result {
        Ok(tokens) => token_success(&tokens),
        Err(err) => err.into_response(),
    }
}

/// Resolve the calling client from HTTP Basic credentials or form fields.
async fn authenticate(
    provider: &OAuthProvider,
    headers: &HeaderMap,
    form: &TokenRequest,
) -> Result<Client, OAuthError> {
    if let Some(Authorization(basic)) = headers.typed_get::<Authorization<Basic>>() {
        return provider.authenticate_client(basic.username(), Some(basic.password())).await;
    }

    let Some(client_id) = form.client_id.as_deref() else {
        return Err(OAuthError::invalid_request("Missing client_id"));
    };
    provider.authenticate_client(client_id, form.client_secret.as_deref()).await
}

async fn authorization_code_grant(
    provider: &OAuthProvider,
    client: &Client,
    form: &TokenRequest,
) -> Result<TokenResponse, OAuthError> {
    let Some(code) = form.code.as_deref() else {
        return Err(OAuthError::invalid_request("Missing code"));
    };

    let challenge = provider.challenge_for_authorization_code(client, code).await?;
    if challenge.is_some() && form.code_verifier.is_none() {
        return Err(OAuthError::invalid_request("Missing code_verifier"));
    }

    provider
        .exchange_authorization_code(
            client,
            code,
            form.code_verifier.as_deref(),
            form.redirect_uri.as_deref(),
        )
        .await
}

async fn refresh_token_grant(
    provider: &OAuthProvider,
    client: &Client,
    form: &TokenRequest,
) -> Result<TokenResponse, OAuthError> {
    let Some(refresh_token) = form.refresh_token.as_deref() else {
        return Err(OAuthError::invalid_request("Missing refresh_token"));
    };
    provider.exchange_refresh_token(client, refresh_token).await
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(tokens: &TokenResponse) -> Response {
    let mut response = Json(tokens).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}
