//! MCP server implementation
//!
//! Implements the stdio transport: one JSON object per line, request at a
//! time. Each line is handled to completion before the next is read, and
//! heartbeat notifications share the same single timeline, so no two frames
//! ever interleave within a line.

use super::protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Method,
    ServerCapabilities, ServerInfo, PROTOCOL_VERSION,
};
use super::tools::{self, ToolContext};
use crate::error::Result;
use crate::fetch::{DocFetcher, GithubClient, RegistryClient};
use crate::store::Store;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time;

/// Delay between the shutdown reply and process exit
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Default heartbeat interval
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// MCP server for the knowledge base
///
/// Owns the store and the collaborator clients; the store must be
/// initialized before [`McpServer::run`] starts reading input.
pub struct McpServer {
    store: Store,
    docs: DocFetcher,
    github: GithubClient,
    registry: RegistryClient,
    heartbeat: Option<Duration>,
    started_at: Instant,
    id_counter: u64,
    heartbeat_seq: u64,
}

impl McpServer {
    /// Create a server around an initialized store
    pub fn new(store: Store) -> Self {
        Self {
            store,
            docs: DocFetcher::new(),
            github: GithubClient::new(),
            registry: RegistryClient::new(),
            heartbeat: Some(DEFAULT_HEARTBEAT),
            started_at: Instant::now(),
            id_counter: 0,
            heartbeat_seq: 0,
        }
    }

    /// Override the heartbeat interval; `None` disables heartbeats
    pub fn with_heartbeat(mut self, interval: Option<Duration>) -> Self {
        self.heartbeat = interval;
        self
    }

    /// Run the server on stdio
    ///
    /// Blocks until EOF on stdin or an unrecoverable write error. Failure
    /// recovery within the loop is "report and continue with the next line".
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(
            "rustkb MCP server started (protocol version {})",
            PROTOCOL_VERSION
        );

        let info = ServerInfo::default();
        self.send_notification(
            &mut stdout,
            "notifications/ready",
            json!({ "name": info.name, "version": info.version }),
        )
        .await?;

        let heartbeat_enabled = self.heartbeat.is_some();
        let period = self.heartbeat.unwrap_or(Duration::from_secs(3600));
        let mut ticker = time::interval_at(time::Instant::now() + period, period);

        loop {
            tokio::select! {
                maybe_line = lines.next_line() => {
                    match maybe_line {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            tracing::debug!("received: {}", line);
                            let response = self.handle_line(line).await;
                            write_line(&mut stdout, &response).await?;
                        }
                        Ok(None) => {
                            tracing::info!("EOF received, shutting down");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("read error: {}", e);
                            break;
                        }
                    }
                }
                _ = ticker.tick(), if heartbeat_enabled => {
                    self.heartbeat_seq += 1;
                    let params = json!({
                        "seq": self.heartbeat_seq,
                        "uptimeSecs": self.started_at.elapsed().as_secs(),
                    });
                    self.send_notification(&mut stdout, "notifications/heartbeat", params).await?;
                }
            }
        }

        Ok(())
    }

    /// Emit a notification frame: method-addressed, no id, no reply expected
    pub async fn send_notification<W>(
        &self,
        writer: &mut W,
        method: &str,
        params: Value,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let note = JsonRpcNotification::new(method, params);
        write_line(writer, &note).await
    }

    /// Emit a server-initiated request frame
    ///
    /// Fire-and-forget: there is no pending-request table, so a peer reply
    /// to this id is never correlated back. Returns the id used.
    pub async fn send_request<W>(
        &mut self,
        writer: &mut W,
        method: &str,
        params: Value,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let id = self.next_local_id();
        let request = JsonRpcRequest::new(id, method, params);
        write_line(writer, &request).await?;
        Ok(id)
    }

    /// Handle one input line, producing exactly one reply
    async fn handle_line(&mut self, line: &str) -> JsonRpcResponse {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                // The malformed input has no usable id; take one from the
                // local counter so the reply still carries an id.
                let id = self.next_local_id();
                JsonRpcResponse::error(
                    Some(Value::from(id)),
                    JsonRpcError::parse_error(format!("Parse error: {}", e)),
                )
            }
        }
    }

    /// Handle a parsed request envelope
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            );
        }

        let result = match Method::parse(&request.method) {
            Some(Method::Initialize) => self.handle_initialize(),
            Some(Method::Shutdown) => self.handle_shutdown(),
            Some(Method::ListTools) => self.handle_list_tools(),
            Some(Method::CallTool) => self.handle_call_tool(&request.params).await,
            None => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    fn handle_initialize(&self) -> std::result::Result<Value, JsonRpcError> {
        let capabilities = ServerCapabilities::default();
        let server_info = ServerInfo::default();

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "serverInfo": server_info
        }))
    }

    fn handle_shutdown(&self) -> std::result::Result<Value, JsonRpcError> {
        tracing::info!("shutdown requested, exiting in {:?}", SHUTDOWN_GRACE);
        tokio::spawn(async {
            time::sleep(SHUTDOWN_GRACE).await;
            std::process::exit(0);
        });
        Ok(Value::Null)
    }

    fn handle_list_tools(&self) -> std::result::Result<Value, JsonRpcError> {
        Ok(json!({ "tools": tools::tool_definitions() }))
    }

    async fn handle_call_tool(
        &self,
        params: &Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params = params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = tools::handle_tool_call(&self.tool_context(), tool_name, &arguments).await?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn tool_context(&self) -> ToolContext<'_> {
        ToolContext {
            store: &self.store,
            docs: &self.docs,
            github: &self.github,
            registry: &self.registry,
            started_at: self.started_at,
        }
    }

    fn next_local_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }
}

/// Write one frame as a single line; each write is an atomic unit
async fn write_line<W, M>(writer: &mut W, message: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_server() -> McpServer {
        let mut store = Store::open_memory().unwrap();
        store.initialize().unwrap();
        McpServer::new(store)
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let server = create_test_server();
        let result = server.handle_initialize().unwrap();

        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"].is_object());
        assert_eq!(result["serverInfo"]["name"], "rustkb");
    }

    #[tokio::test]
    async fn test_unknown_method_echoes_id() {
        let server = create_test_server();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(7)),
            method: "nope".to_string(),
            params: Some(json!({})),
        };

        let response = server.handle_request(request).await;
        assert_eq!(response.id, Some(json!(7)));
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_parse_error_uses_local_monotonic_ids() {
        let mut server = create_test_server();

        let first = server.handle_line("not-json").await;
        assert_eq!(first.error.as_ref().unwrap().code, -32700);
        assert_eq!(first.id, Some(json!(1)));

        let second = server.handle_line("{broken").await;
        assert_eq!(second.error.as_ref().unwrap().code, -32700);
        assert_eq!(second.id, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let mut server = create_test_server();
        let response = server
            .handle_line(r#"{"jsonrpc":"1.0","id":3,"method":"initialize","params":{}}"#)
            .await;
        assert_eq!(response.error.unwrap().code, -32600);
        assert_eq!(response.id, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_list_tools_idempotent() {
        let server = create_test_server();

        let names = |value: &Value| -> Vec<String> {
            value["tools"]
                .as_array()
                .unwrap()
                .iter()
                .map(|t| t["name"].as_str().unwrap().to_string())
                .collect()
        };

        let first = server.handle_list_tools().unwrap();
        let second = server.handle_list_tools().unwrap();
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first).len(), 10);
    }

    #[tokio::test]
    async fn test_call_tool_missing_name() {
        let server = create_test_server();
        let result = server.handle_call_tool(&Some(json!({"arguments": {}}))).await;
        assert_eq!(result.unwrap_err().code, -32602);
    }

    #[tokio::test]
    async fn test_call_tool_missing_params() {
        let server = create_test_server();
        let result = server.handle_call_tool(&None).await;
        assert_eq!(result.unwrap_err().code, -32602);
    }

    #[tokio::test]
    async fn test_call_tool_without_arguments_object() {
        let server = create_test_server();
        let result = server
            .handle_call_tool(&Some(json!({"name": "get_server_status"})))
            .await
            .unwrap();
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn test_send_request_increments_ids() {
        let mut server = create_test_server();
        let mut out: Vec<u8> = Vec::new();

        let first = server
            .send_request(&mut out, "peer/refresh", json!({}))
            .await
            .unwrap();
        let second = server
            .send_request(&mut out, "peer/refresh", json!({}))
            .await
            .unwrap();
        assert!(second > first);

        let text = String::from_utf8(out).unwrap();
        let frames: Vec<&str> = text.lines().collect();
        assert_eq!(frames.len(), 2);
        let frame: Value = serde_json::from_str(frames[0]).unwrap();
        assert_eq!(frame["jsonrpc"], "2.0");
        assert_eq!(frame["method"], "peer/refresh");
        assert_eq!(frame["id"], json!(first));
    }

    #[tokio::test]
    async fn test_notification_frame_has_no_id() {
        let server = create_test_server();
        let mut out: Vec<u8> = Vec::new();

        server
            .send_notification(&mut out, "notifications/heartbeat", json!({"seq": 1}))
            .await
            .unwrap();

        let frame: Value = serde_json::from_slice(&out).unwrap();
        assert!(frame.get("id").is_none());
        assert_eq!(frame["method"], "notifications/heartbeat");
    }
}
