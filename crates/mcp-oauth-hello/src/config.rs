//! Configuration for the MCP OAuth demo server.

use std::time::Duration;

/// OAuth provider constants.
pub mod oauth {
    use std::time::Duration;

    /// Authorization code lifetime (5 minutes).
    pub const AUTH_CODE_TTL: Duration = Duration::from_secs(5 * 60);

    /// Access token lifetime (1 hour).
    pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(3600);

    /// Lifetime of the pre-seeded bootstrap token, counted from startup.
    pub const DEV_TOKEN_TTL: Duration = Duration::from_secs(3600);

    /// Scope granted when the authorization request names none.
    pub const DEFAULT_SCOPE: &str = "read";

    /// The fixed scope set this server understands.
    pub const SUPPORTED_SCOPES: &[&str] = &["read", "write"];

    /// Subject bound to every authorization (consent is auto-granted).
    pub const DEMO_SUBJECT: &str = "user-1";

    /// Pre-seeded bootstrap bearer token.
    pub const DEV_TOKEN: &str = "dev-token-12345";

    /// Scope of the bootstrap token.
    pub const DEV_TOKEN_SCOPE: &str = "read write";

    /// Client id reported for bootstrap tokens, which have no registered client.
    pub const DEV_CLIENT_ID: &str = "dev-client";

    /// Auth method assumed when registration metadata names none.
    pub const DEFAULT_TOKEN_ENDPOINT_AUTH_METHOD: &str = "client_secret_post";
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port.
    pub port: u16,

    /// Public base URL, used as issuer and in metadata documents.
    pub base_url: String,

    /// Authorization code lifetime.
    pub auth_code_ttl: Duration,

    /// Access token lifetime.
    pub access_token_ttl: Duration,

    /// Scope applied when a request names none.
    pub default_scope: String,

    /// Subject every authorization is bound to.
    pub subject: String,

    /// Bootstrap bearer token seeded at startup (None disables it).
    pub dev_token: Option<String>,

    /// Period of the expired-entry sweep (None leaves cleanup to access time).
    pub cleanup_interval: Option<Duration>,

    /// Set when `base_url` was derived from `port` rather than given.
    base_url_from_port: bool,
}

impl Config {
    /// Create a configuration for the given port and optional public base URL.
    ///
    /// Without a base URL the server advertises `http://localhost:{port}`.
    #[must_use]
    pub fn new(port: u16, base_url: Option<String>) -> Self {
        let base_url_from_port = base_url.is_none();
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        Self {
            port,
            base_url,
            auth_code_ttl: oauth::AUTH_CODE_TTL,
            access_token_ttl: oauth::ACCESS_TOKEN_TTL,
            default_scope: oauth::DEFAULT_SCOPE.to_string(),
            subject: oauth::DEMO_SUBJECT.to_string(),
            dev_token: Some(oauth::DEV_TOKEN.to_string()),
            cleanup_interval: None,
            base_url_from_port,
        }
    }

    /// Create a test configuration advertising the given base URL.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self::new(0, Some(base_url.to_string()))
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `PORT`, `BASE_URL`, `MCP_DEV_TOKEN` (empty disables the bootstrap
    /// token) and `OAUTH_CLEANUP_INTERVAL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| anyhow::anyhow!("invalid PORT '{raw}': {e}"))?,
            None => 3000,
        };

        let mut config = Self::new(port, lookup("BASE_URL"));

        if let Some(token) = lookup("MCP_DEV_TOKEN") {
            config.dev_token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(raw) = lookup("OAUTH_CLEANUP_INTERVAL_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid OAUTH_CLEANUP_INTERVAL_SECS '{raw}': {e}"))?;
            config.cleanup_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Apply command-line overrides on top of this configuration.
    ///
    /// A new port moves the default base URL with it unless a base URL was
    /// given explicitly, either here or in the environment.
    #[must_use]
    pub fn with_overrides(mut self, port: Option<u16>, base_url: Option<String>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        match base_url {
            Some(url) => {
                self.base_url = url.trim_end_matches('/').to_string();
                self.base_url_from_port = false;
            }
            None if self.base_url_from_port => {
                self.base_url = format!("http://localhost:{}", self.port);
            }
            None => {}
        }
        self
    }

    /// Metadata URL of the protected resource (RFC 9728).
    #[must_use]
    pub fn resource_metadata_url(&self) -> String {
        format!("{}/.well-known/oauth-protected-resource", self.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(3000, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.auth_code_ttl, Duration::from_secs(300));
        assert_eq!(config.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.default_scope, "read");
        assert_eq!(config.dev_token.as_deref(), Some("dev-token-12345"));
        assert!(config.cleanup_interval.is_none());
    }

    #[test]
    fn test_config_trims_base_url() {
        let config = Config::new(8080, Some("https://auth.example.com/".to_string()));
        assert_eq!(config.base_url, "https://auth.example.com");
        assert_eq!(
            config.resource_metadata_url(),
            "https://auth.example.com/.well-known/oauth-protected-resource"
        );
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_string())
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(vars(&[
            ("PORT", "4000"),
            ("MCP_DEV_TOKEN", ""),
            ("OAUTH_CLEANUP_INTERVAL_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.base_url, "http://localhost:4000");
        assert!(config.dev_token.is_none());
        assert_eq!(config.cleanup_interval, Some(Duration::from_secs(30)));

        assert!(Config::from_lookup(vars(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_cli_port_moves_derived_base_url() {
        let config = Config::from_lookup(vars(&[])).unwrap().with_overrides(Some(9000), None);
        assert_eq!(config.port, 9000);
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_env_base_url_survives_cli_port() {
        let config = Config::from_lookup(vars(&[("BASE_URL", "https://auth.example.com/")]))
            .unwrap()
            .with_overrides(Some(9000), None);
        assert_eq!(config.port, 9000);
        assert_eq!(config.base_url, "https://auth.example.com");
    }

    #[test]
    fn test_cli_base_url_wins() {
        let config = Config::from_lookup(vars(&[("BASE_URL", "https://env.example.com")]))
            .unwrap()
            .with_overrides(None, Some("https://cli.example.com/".to_string()));
        assert_eq!(config.base_url, "https://cli.example.com");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_supported_scopes() {
        assert!(oauth::SUPPORTED_SCOPES.contains(&oauth::DEFAULT_SCOPE));
        assert_eq!(oauth::SUPPORTED_SCOPES.len(), 2);
    }
}
