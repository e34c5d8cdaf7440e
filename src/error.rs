//! Error types for the MCP server.
//!
//! Maps Grist transport failures and argument problems to MCP-friendly error responses.

use serde::{Deserialize, Serialize};

/// MCP server errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum McpError {
    /// Unknown tool requested.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Required configuration (API key, document) is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Access refused, either by the allow-list or by Grist (403).
    #[error("permission denied: {0}")]
    Permission(String),

    /// Grist rejected the API key (401).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Grist returned 404 for the addressed resource.
    #[error("Resource '{0}' not found in Grist document")]
    NotFound(String),

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other HTTP error status from Grist.
    #[error("Grist API error: {status}{}", .message.as_ref().map(|m| format!(" - {}", m)).unwrap_or_default())]
    Remote {
        /// HTTP status code
        status: u16,
        /// `error` or `message` field of the response body, when present
        message: Option<String>,
    },

    /// A successful response whose body is not valid JSON.
    #[error("malformed response from Grist: {0}")]
    MalformedResponse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Shorthand for an [`McpError::InvalidArg`].
    pub fn invalid_arg(name: &str, reason: impl Into<String>) -> Self {
        McpError::InvalidArg {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Internal(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl McpError {
    /// Whether the caller supplied bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            McpError::UnknownTool(_) | McpError::MissingArg(_) | McpError::InvalidArg { .. }
        )
    }

    /// Convert to JSON-RPC error code.
    ///
    /// Only invalid input is distinguished; every other failure is an internal error.
    pub fn rpc_code(&self) -> i32 {
        if self.is_validation() {
            rpc_codes::INVALID_PARAMS
        } else {
            rpc_codes::INTERNAL_ERROR
        }
    }

    /// Stable label for logs and the JSON-RPC `data` field.
    pub fn kind(&self) -> &'static str {
        match self {
            McpError::UnknownTool(_) | McpError::MissingArg(_) | McpError::InvalidArg { .. } => {
                "validation"
            }
            McpError::Configuration(_) => "configuration",
            McpError::Permission(_) => "permission",
            McpError::Auth(_) => "auth",
            McpError::NotFound(_) => "not_found",
            McpError::Transport(_) => "transport",
            McpError::Remote { .. } => "remote",
            McpError::MalformedResponse(_) => "malformed_response",
            McpError::Io(_) => "io",
            McpError::Internal(_) => "internal",
        }
    }
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;
