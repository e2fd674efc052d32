//! HTTP server: OAuth endpoints, the demo API and the MCP endpoint.

pub mod api;
pub mod auth;
pub mod oauth;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use crate::config::Config;
use crate::models::DemoDirectory;
use crate::oauth::OAuthProvider;
use transport::HttpState;

/// Authorization server plus the resources it protects.
pub struct OAuthServer {
    config: Config,
    state: Arc<HttpState>,
}

impl OAuthServer {
    /// Create a server with a fresh provider and the seeded demo directory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let provider = Arc::new(OAuthProvider::new(&config));
        Self::with_provider(config, provider, Arc::new(DemoDirectory::seeded()))
    }

    /// Create a server around an existing provider and directory.
    #[must_use]
    pub fn with_provider(
        config: Config,
        provider: Arc<OAuthProvider>,
        directory: Arc<DemoDirectory>,
    ) -> Self {
        let state = Arc::new(HttpState::new(provider, directory, &config));
        Self { config, state }
    }

    /// The provider behind this server.
    #[must_use]
    pub fn provider(&self) -> &Arc<OAuthProvider> {
        &self.state.provider
    }

    /// Build the axum router without binding a socket.
    #[must_use]
    pub fn router(&self) -> Router {
        transport::create_router(Arc::clone(&self.state))
    }

    /// Bind the configured port and serve until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server fails.
    pub async fn run(self) -> anyhow::Result<()> {
        if let Some(interval) = self.config.cleanup_interval {
            tracing::info!(interval_secs = interval.as_secs(), "Starting expired-record sweep");
            Arc::clone(&self.state.provider).start_cleanup_task(interval);
        }

        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);
        tracing::info!(base_url = %self.config.base_url, "OAuth issuer");
        if self.config.dev_token.is_some() {
            tracing::warn!("Bootstrap bearer token is enabled; set MCP_DEV_TOKEN= to disable");
        }

        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for OAuthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthServer")
            .field("port", &self.config.port)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
