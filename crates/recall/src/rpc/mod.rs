//! JSON-RPC surface
//!
//! One HTTP endpoint, one logical method per operation. Wire types follow
//! JSON-RPC 2.0; tenant identity arrives out-of-band in the `x-tenant-id`
//! header and is treated as an opaque string.

pub mod handlers;
pub mod server;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecallError;

pub use server::{AppState, RpcServer, create_router};

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Structured error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError { code, message }),
        }
    }

    /// Create an error response from a RecallError
    pub fn from_error(id: Option<Value>, err: RecallError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }
}

/// Well-known protocol error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const NOT_FOUND: i64 = -32001;
    pub const INTERNAL: i64 = -32000;
}
