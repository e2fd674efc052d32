//! Demo tools: account info, posts and profile of the authenticated subject.

use async_trait::async_trait;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};

fn empty_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

/// `get_demo_info`: the caller's account record.
pub struct DemoInfoTool;

#[async_trait]
impl McpTool for DemoInfoTool {
    fn name(&self) -> &'static str {
        "get_demo_info"
    }

    fn description(&self) -> &'static str {
        "Get demo account information (test data only)"
    }

    fn input_schema(&self) -> serde_json::Value {
        empty_schema()
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let user = ctx
            .directory
            .user(&ctx.auth.subject)
            .ok_or_else(|| ToolError::not_found(format!("user {}", ctx.auth.subject)))?;
        Ok(serde_json::to_string_pretty(user)?)
    }
}

/// `get_demo_posts`: the caller's posts. Requires the `read` scope.
pub struct DemoPostsTool;

#[async_trait]
impl McpTool for DemoPostsTool {
    fn name(&self) -> &'static str {
        "get_demo_posts"
    }

    fn description(&self) -> &'static str {
        "Get sample posts (test data only)"
    }

    fn input_schema(&self) -> serde_json::Value {
        empty_schema()
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        ctx.require_scope("read")?;
        let posts = ctx.directory.posts_for(&ctx.auth.subject);
        Ok(serde_json::to_string_pretty(&serde_json::json!({ "posts": posts }))?)
    }
}

/// `get_demo_profile`: account record plus post statistics.
pub struct DemoProfileTool;

#[async_trait]
impl McpTool for DemoProfileTool {
    fn name(&self) -> &'static str {
        "get_demo_profile"
    }

    fn description(&self) -> &'static str {
        "Get sample profile with statistics (test data only)"
    }

    fn input_schema(&self) -> serde_json::Value {
        empty_schema()
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let profile = ctx
            .directory
            .profile(&ctx.auth.subject)
            .ok_or_else(|| ToolError::not_found(format!("user {}", ctx.auth.subject)))?;
        Ok(serde_json::to_string_pretty(&profile)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::DemoDirectory;
    use crate::oauth::AuthInfo;

    fn ctx(subject: &str, scopes: &[&str]) -> ToolContext {
        ToolContext::new(
            Arc::new(DemoDirectory::seeded()),
            AuthInfo {
                token: "t".into(),
                client_id: "c".into(),
                scopes: scopes.iter().map(|s| s.to_string()).collect(),
                expires_at: 0,
                subject: subject.into(),
            },
        )
    }

    #[tokio::test]
    async fn test_info_tool() {
        let out = DemoInfoTool.execute(&ctx("user-1", &["read"]), serde_json::json!({})).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["username"], "demo-user");
    }

    #[tokio::test]
    async fn test_posts_tool_requires_read() {
        let err = DemoPostsTool
            .execute(&ctx("user-1", &["write"]), serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InsufficientScope(ref s) if s == "read"));

        let out = DemoPostsTool.execute(&ctx("user-1", &["read"]), serde_json::json!({})).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["posts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_profile_tool_unknown_user() {
        let err = DemoProfileTool
            .execute(&ctx("user-9", &["read"]), serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
