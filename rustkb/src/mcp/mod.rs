//! MCP server for the knowledge base
//!
//! Implements a line-delimited JSON-RPC 2.0 server over stdio, exposing the
//! store and its collaborators as named tools.
//!
//! ## Methods
//!
//! - `initialize` - protocol version, capabilities, server info
//! - `shutdown` - schedules process exit after a short grace delay
//! - `list_tools` - the fixed tool catalog
//! - `call_tool` - dispatch one named tool
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rustkb::mcp::McpServer;
//! use rustkb::Store;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut store = Store::open(rustkb::default_db_path()).unwrap();
//!     store.initialize().unwrap();
//!     McpServer::new(store).run().await.unwrap();
//! }
//! ```

mod protocol;
mod server;
pub mod tools;

pub use protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Method, ServerInfo,
    ToolDefinition, ToolResult, PROTOCOL_VERSION,
};
pub use server::{McpServer, DEFAULT_HEARTBEAT};
