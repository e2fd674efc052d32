//! Bearer authentication for protected routes (RFC 6750).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use super::transport::HttpState;
use crate::oauth::AuthInfo;

/// Reasons a protected request is turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No usable bearer token (401).
    Unauthorized {
        /// `error_description` for the client
        description: String,
        /// Where clients discover the authorization server
        resource_metadata: String,
    },
    /// The token is valid but lacks a scope (403).
    InsufficientScope {
        /// The scope the route needs
        scope: String,
    },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, challenge, body) = match &self {
            Self::Unauthorized { description, resource_metadata } => (
                StatusCode::UNAUTHORIZED,
                format!(
                    "Bearer error=\"invalid_token\", error_description=\"{description}\", \
                     resource_metadata=\"{resource_metadata}\""
                ),
                serde_json::json!({
                    "error": "invalid_token",
                    "error_description": description
                }),
            ),
            Self::InsufficientScope { scope } => (
                StatusCode::FORBIDDEN,
                format!("Bearer error=\"insufficient_scope\", scope=\"{scope}\""),
                serde_json::json!({
                    "error": "insufficient_scope",
                    "error_description": format!("Required scope: {scope}")
                }),
            ),
        };

        let mut response = (status, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Extract the bearer token, distinguishing a missing header from a malformed one.
fn bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    if !headers.contains_key(header::AUTHORIZATION) {
        return Err("Missing Authorization header");
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
        .ok_or("Invalid Authorization header format, expected 'Bearer TOKEN'")
}

/// Middleware that admits requests carrying a valid bearer token.
///
/// The resolved [`AuthInfo`] is inserted into request extensions for handlers.
pub async fn require_bearer(
    State(state): State<Arc<HttpState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let unauthorized = |description: &str| AuthRejection::Unauthorized {
        description: description.to_string(),
        resource_metadata: state.resource_metadata_url.clone(),
    };

    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(description) => return unauthorized(description).into_response(),
    };

    match state.verifier.verify(&token).await {
        Ok(auth) => {
            tracing::debug!(client_id = %auth.client_id, subject = %auth.subject, "Bearer accepted");
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "Bearer rejected");
            unauthorized(&err.description()).into_response()
        }
    }
}

/// Fail with 403 unless `auth` grants `scope`.
pub fn require_scope(auth: &AuthInfo, scope: &str) -> Result<(), AuthRejection> {
    if auth.has_scope(scope) {
        Ok(())
    } else {
        Err(AuthRejection::InsufficientScope { scope: scope.to_string() })
    }
}
