//! JSON-RPC 2.0 protocol types
//!
//! One JSON object per line over stdio. Requests carry an id and expect a
//! reply; notifications carry no id and expect nothing back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Request id; absent for peer-initiated notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Optional parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build an outbound request frame
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(id)),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Request id (matches the request)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Result (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 notification: method-addressed, no id, no reply expected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: Value,
}

impl JsonRpcNotification {
    /// Create a notification frame
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(-32700, message)
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(-32600, message)
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {}", method))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(-32603, message)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// The closed set of methods the engine serves
///
/// `initialize` and `shutdown` are engine built-ins; `list_tools` and
/// `call_tool` belong to the tool dispatcher. Anything else is
/// MethodNotFound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Shutdown,
    ListTools,
    CallTool,
}

impl Method {
    /// Resolve a wire method name; `None` means MethodNotFound
    pub fn parse(name: &str) -> Option<Method> {
        match name {
            "initialize" => Some(Method::Initialize),
            "shutdown" => Some(Method::Shutdown),
            "list_tools" => Some(Method::ListTools),
            "call_tool" => Some(Method::CallTool),
            _ => None,
        }
    }
}

/// Protocol version reported by `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server capabilities reported by `initialize`
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tools capability
    pub tools: ToolsCapability,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: ToolsCapability {},
        }
    }
}

/// Tools capability (empty object indicates tools are supported)
#[derive(Debug, Clone, Serialize, Default)]
pub struct ToolsCapability {}

/// Server identity reported by `initialize`
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "rustkb".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Tool descriptor returned by `list_tools`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input schema (JSON Schema)
    pub input_schema: Value,
}

/// Tool call result content
#[derive(Debug, Clone, Serialize)]
pub struct ToolContent {
    /// Content type (usually "text")
    #[serde(rename = "type")]
    pub content_type: String,
    /// Content text
    pub text: String,
}

impl ToolContent {
    /// Create a text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Tool call result payload
///
/// `is_error` is the payload-level failure channel: a tool body that fails
/// still produces a successful protocol reply, with this flag set. Callers
/// must inspect it; the envelope alone does not signal tool failure.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Content array
    pub content: Vec<ToolContent>,
    /// Whether the payload describes a tool-body failure
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result with a single text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: false,
        }
    }

    /// Create a failed result carrying human-readable error text
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: true,
        }
    }
}
