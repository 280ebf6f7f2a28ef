//! Wire protocol types for the MCP tool interface.
//!
//! The transport is line-delimited JSON-RPC 2.0 over stdio; this crate owns
//! the request/response frames, error codes, and tool descriptors the server
//! exchanges with clients.

mod tool;

pub use tool::{
    builtin_tools, CallToolResult, ContentBlock, ForgetArgs, ListMemoriesArgs, RecallArgs,
    RememberArgs, ToolCallParams, ToolDescriptor,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version sent on every frame.
pub const JSONRPC_VERSION: &str = "2.0";
/// MCP protocol revision implemented by the server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Well-known JSON-RPC error codes.
pub mod error_codes {
    /// The request line was not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// The method is not part of the protocol.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Parameters were missing or malformed.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Execution failed inside the server.
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// An incoming JSON-RPC request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    /// Caller-chosen id; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// An outgoing JSON-RPC response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Successful response for a request id.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::from(0)),
            result: Some(result),
            error: None,
        }
    }

    /// Error response for a request id; a missing id is reported as `0`
    /// rather than `null`.
    pub fn failure(id: Option<Value>, error: RpcError) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::from(0)),
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Build an error with a detail string in `data`.
    pub fn new(code: i64, message: impl Into<String>, data: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
            data: Some(Value::from(data.into())),
        }
    }
}
