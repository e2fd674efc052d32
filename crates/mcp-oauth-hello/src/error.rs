//! Error types for the OAuth provider and the MCP demo tools.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

/// Errors from the OAuth provider and its HTTP boundary.
///
/// Each variant maps onto one RFC 6749 / RFC 7591 error code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// Authorization code or refresh token is unknown, expired, or bound to another client.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Why the grant was rejected
        message: String,
    },

    /// Access token is unknown or expired.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Why the token was rejected
        message: String,
    },

    /// Client is not registered or failed authentication.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Why the client was rejected
        message: String,
    },

    /// Request is missing a parameter or is otherwise malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What is wrong with the request
        message: String,
    },

    /// Requested scope is outside the supported set.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// The offending scope
        message: String,
    },

    /// Registration metadata is unacceptable.
    #[error("Invalid client metadata: {message}")]
    InvalidClientMetadata {
        /// What is wrong with the metadata
        message: String,
    },

    /// The token endpoint does not support this grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The requested grant type
        grant_type: String,
    },

    /// The authorization endpoint does not support this response type.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The requested response type
        response_type: String,
    },
}

impl OAuthError {
    /// Create an invalid grant error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant { message: message.into() }
    }

    /// Create an invalid token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken { message: message.into() }
    }

    /// Create an invalid client error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient { message: message.into() }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create an invalid scope error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope { message: message.into() }
    }

    /// Create an invalid client metadata error.
    #[must_use]
    pub fn invalid_client_metadata(message: impl Into<String>) -> Self {
        Self::InvalidClientMetadata { message: message.into() }
    }

    /// The OAuth `error` code for this failure.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidToken { .. } => "invalid_token",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::InvalidClientMetadata { .. } => "invalid_client_metadata",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
        }
    }

    /// Human-readable `error_description`.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::InvalidGrant { message }
            | Self::InvalidToken { message }
            | Self::InvalidClient { message }
            | Self::InvalidRequest { message }
            | Self::InvalidScope { message }
            | Self::InvalidClientMetadata { message } => message.clone(),
            Self::UnsupportedGrantType { grant_type } => {
                format!("grant_type '{grant_type}' is not supported")
            }
            Self::UnsupportedResponseType { response_type } => {
                format!("response_type '{response_type}' is not supported")
            }
        }
    }

    /// Returns true if the caller should answer 401 rather than 400.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::InvalidToken { .. } | Self::InvalidClient { .. })
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller's token lacks a required scope
    #[error("Insufficient scope: requires '{0}'")]
    InsufficientScope(String),
}

impl ToolError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Convert to a user-friendly error message for MCP response.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Serialization(_) => "Failed to encode tool output".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
