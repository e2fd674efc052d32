//! HTTP transport.
//!
//! Public routes serve OAuth discovery, registration, authorization and token
//! exchange. Everything under `/api` and `/mcp` sits behind the bearer
//! middleware in [`super::auth`].

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{api, auth, oauth::handlers};
use crate::config::Config;
use crate::models::DemoDirectory;
use crate::oauth::{AuthInfo, BearerVerifier, OAuthProvider};
use crate::tools::{self, McpTool, ToolContext};

/// Server name reported by health checks and `initialize`.
const SERVICE_NAME: &str = "mcp-oauth-hello";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into() }),
            id,
        }
    }
}

/// MCP tool info for tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub provider: Arc<OAuthProvider>,
    /// Bearer check used by protected routes.
    pub verifier: Arc<dyn BearerVerifier>,
    pub directory: Arc<DemoDirectory>,
    pub tools: Vec<Box<dyn McpTool>>,
    /// Issuer and resource identifier, without trailing slash.
    pub base_url: String,
    /// RFC 9728 metadata URL advertised in `WWW-Authenticate` challenges.
    pub resource_metadata_url: String,
}

impl HttpState {
    /// Build state around a provider; the provider also verifies bearer tokens.
    #[must_use]
    pub fn new(provider: Arc<OAuthProvider>, directory: Arc<DemoDirectory>, config: &Config) -> Self {
        Self {
            verifier: Arc::clone(&provider) as Arc<dyn BearerVerifier>,
            provider,
            directory,
            tools: tools::register_all_tools(),
            base_url: config.base_url.clone(),
            resource_metadata_url: config.resource_metadata_url(),
        }
    }
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState")
            .field("base_url", &self.base_url)
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<HttpState>) -> Router {
    let protected = Router::new()
        .route("/api/me", get(api::handle_me))
        .route("/api/posts", get(api::handle_posts))
        .route("/api/profile", get(api::handle_profile))
        .route("/mcp", post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), auth::require_bearer));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route(
            "/.well-known/oauth-protected-resource",
            get(handlers::handle_protected_resource),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::handle_auth_server_metadata),
        )
        .route("/register", post(handlers::handle_register))
        .route(
            "/authorize",
            get(handlers::handle_authorize_get).post(handlers::handle_authorize_post),
        )
        .route("/token", post(handlers::handle_token))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `POST /mcp`: JSON-RPC over streamable HTTP, answered inline.
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    Extension(auth): Extension<AuthInfo>,
    Json(req): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!(method = %req.method, subject = %auth.subject, "Handling MCP request");

    let is_notification = req.id.is_none();

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(req.id, handle_initialize(&req.params)),
        "notifications/initialized" | "initialized" => {
            if is_notification {
                return StatusCode::ACCEPTED.into_response();
            }
            JsonRpcResponse::success(req.id, serde_json::json!({}))
        }
        "tools/list" => handle_tools_list(req.id, &state.tools),
        "tools/call" => handle_tools_call(req.id, &req.params, &state, auth).await,
        "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
        _ if is_notification => return StatusCode::ACCEPTED.into_response(),
        method => {
            JsonRpcResponse::error(req.id, -32601, format!("Method not found: {method}"))
        }
    };

    Json(response).into_response()
}

fn handle_initialize(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version =
        params.get("protocolVersion").and_then(|v| v.as_str()).unwrap_or("2025-06-18");

    tracing::info!("MCP initialize: protocol version {}", protocol_version);

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn handle_tools_list(id: Option<serde_json::Value>, tools: &[Box<dyn McpTool>]) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
}

async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    state: &HttpState,
    auth: AuthInfo,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, -32602, "Missing 'name' parameter");
    };

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| serde_json::json!({}));

    let Some(tool) = state.tools.iter().find(|t| t.name() == tool_name) else {
        return JsonRpcResponse::error(id, -32602, format!("Tool not found: {tool_name}"));
    };

    tracing::info!(tool = %tool_name, subject = %auth.subject, "Executing tool");

    let ctx = ToolContext::new(Arc::clone(&state.directory), auth);
    match tool.execute(&ctx, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            }),
        ),
        Err(e) => {
            tracing::warn!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::error(id, -32000, format!("Tool error: {}", e.to_user_message()))
        }
    }
}
