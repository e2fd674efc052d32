//! MCP tool implementations.
//!
//! Each tool reads the demo directory on behalf of the subject of the bearer
//! token that authorized the MCP request.

mod demo;

pub use demo::*;

use std::sync::Arc;

use crate::error::{ToolError, ToolResult};
use crate::models::DemoDirectory;
use crate::oauth::AuthInfo;

/// Tool execution context.
pub struct ToolContext {
    /// Demo users and posts.
    pub directory: Arc<DemoDirectory>,
    /// Identity resolved from the request's bearer token.
    pub auth: AuthInfo,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(directory: Arc<DemoDirectory>, auth: AuthInfo) -> Self {
        Self { directory, auth }
    }

    /// Fail unless the caller's token grants `scope`.
    pub fn require_scope(&self, scope: &str) -> ToolResult<()> {
        if self.auth.has_scope(scope) {
            Ok(())
        } else {
            Err(ToolError::InsufficientScope(scope.to_string()))
        }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "get_demo_info").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(demo::DemoInfoTool),
        Box::new(demo::DemoPostsTool),
        Box::new(demo::DemoProfileTool),
    ]
}
