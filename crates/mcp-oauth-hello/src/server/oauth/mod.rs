//! OAuth 2.1 HTTP endpoints for MCP authentication.
//!
//! Thin axum handlers over [`crate::oauth::OAuthProvider`]; request
//! validation that depends on registered client data happens here.
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code and Refresh Token Grants

pub mod handlers;
