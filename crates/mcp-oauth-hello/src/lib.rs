//! MCP OAuth Hello
//!
//! A self-contained OAuth 2.1 authorization server and the bearer-protected
//! resources it guards, for trying out the MCP authorization flow end to end.
//!
//! # Features
//!
//! - **Dynamic client registration** (RFC 7591) and server metadata (RFC 8414, RFC 9728)
//! - **Authorization code grant** with PKCE and single-use, 5-minute codes
//! - **Refresh token grant** issuing fresh 1-hour access tokens
//! - **Bootstrap bearer token** for development, checked after issued tokens
//! - **Demo resources**: `/api/me`, `/api/posts`, `/api/profile` and three MCP tools
//!
//! # Example
//!
//! ```no_run
//! use mcp_oauth_hello::{config::Config, server::OAuthServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     OAuthServer::new(config).run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod oauth;
pub mod server;
pub mod tools;

pub use config::Config;
pub use error::{OAuthError, ToolError};
pub use oauth::OAuthProvider;
pub use server::OAuthServer;
