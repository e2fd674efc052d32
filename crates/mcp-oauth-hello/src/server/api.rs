//! Bearer-protected demo REST API.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::auth::require_scope;
use super::transport::HttpState;
use crate::oauth::AuthInfo;

fn user_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "user_not_found",
            "error_description": "User not found"
        })),
    )
        .into_response()
}

/// `GET /api/me`
pub async fn handle_me(
    State(state): State<Arc<HttpState>>,
    Extension(auth): Extension<AuthInfo>,
) -> Response {
    match state.directory.user(&auth.subject) {
        Some(user) => Json(user).into_response(),
        None => user_not_found(),
    }
}

/// `GET /api/posts` (scope `read`)
pub async fn handle_posts(
    State(state): State<Arc<HttpState>>,
    Extension(auth): Extension<AuthInfo>,
) -> Response {
    if let Err(rejection) = require_scope(&auth, "read") {
        return rejection.into_response();
    }
    let posts = state.directory.posts_for(&auth.subject);
    Json(serde_json::json!({ "posts": posts })).into_response()
}

/// `GET /api/profile`
pub async fn handle_profile(
    State(state): State<Arc<HttpState>>,
    Extension(auth): Extension<AuthInfo>,
) -> Response {
    match state.directory.profile(&auth.subject) {
        Some(profile) => Json(profile).into_response(),
        None => user_not_found(),
    }
}
