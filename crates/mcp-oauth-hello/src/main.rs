//! MCP OAuth Hello - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mcp_oauth_hello::{config::Config, server::OAuthServer};

#[derive(Parser, Debug)]
#[command(name = "mcp-oauth-hello")]
#[command(about = "OAuth 2.1 authorization server with a bearer-protected MCP demo")]
#[command(version)]
struct Cli {
    /// HTTP server port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Public base URL used as issuer and resource identifier (overrides BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let config = Config::from_env()?.with_overrides(cli.port, cli.base_url);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        base_url = %config.base_url,
        "Starting MCP OAuth server"
    );

    OAuthServer::new(config).run().await
}
