//! Error types for the OrcheSight MCP server

use std::io;

use thiserror::Error;

use crate::client::GatewayError;

/// Result type alias for the OrcheSight MCP server
pub type Result<T> = std::result::Result<T, Error>;

/// OrcheSight MCP errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool arguments rejected before any gateway call
    #[error("{0}")]
    Validation(String),

    /// Backend call through the API gateway failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON-RPC error
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// Error code
        code: i32,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a JSON-RPC error
    pub fn json_rpc(code: i32, message: impl Into<String>) -> Self {
        Self::JsonRpc {
            code,
            message: message.into(),
        }
    }

    /// Convert to JSON-RPC error code
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::JsonRpc { code, .. } => *code,
            Self::Json(_) => rpc_codes::PARSE_ERROR,
            Self::Protocol(_) => rpc_codes::INVALID_REQUEST,
            Self::Validation(_) => rpc_codes::INVALID_PARAMS,
            Self::UnknownTool(_) => rpc_codes::METHOD_NOT_FOUND,
            Self::Gateway(_) => rpc_codes::SERVER_ERROR_START,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// Standard JSON-RPC error codes
pub mod rpc_codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - Not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Server error range start
    pub const SERVER_ERROR_START: i32 = -32000;
}
