use crate::app::App;
use crate::constants::server::{NAME, PROTOCOL_VERSION, VERSION};
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new() -> Result<Self, ToolError> {
        let app = App::initialize()?;
        Ok(Self::with_app(Arc::new(app)))
    }

    pub fn with_app(app: Arc<App>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"list": true, "call": true}},
            "serverInfo": {"name": NAME, "version": VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": tool_catalog() })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() {
            return Err(McpError::new(ErrorCode::InvalidParams, "Missing tool name"));
        }
        let args = params
            .get("arguments")
            .cloned()
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let result = self.app.tool_executor.execute(name, args).await?;
        Ok(result.to_value())
    }

    /// Dispatches one request. Notifications yield no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone()?;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "notifications/initialized" | "ping" => {
                JsonRpcResponse::success(id, serde_json::json!({}))
            }
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => match self.handle_tools_call(&request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => JsonRpcResponse::from_error(id, err),
            },
            _ => JsonRpcResponse::from_error(
                id,
                McpError::new(ErrorCode::MethodNotFound, "Method not found"),
            ),
        };
        Some(response)
    }

    /// Parses one line of the stdio channel. Lines that are not JSON, or not
    /// a request, are answered with an id of null.
    pub fn parse_line(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let parsed: Value = serde_json::from_str(line).map_err(|_| {
            JsonRpcResponse::from_error(
                Value::Null,
                McpError::new(ErrorCode::ParseError, "Parse error"),
            )
        })?;
        serde_json::from_value(parsed).map_err(|_| {
            JsonRpcResponse::from_error(
                Value::Null,
                McpError::new(ErrorCode::InvalidRequest, "Invalid request"),
            )
        })
    }

    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match Self::parse_line(line) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    /// Serves newline-delimited JSON-RPC on stdin/stdout until stdin closes.
    ///
    /// Tool calls run as separate tasks so a slow target never holds up the
    /// channel; a single writer task keeps response lines whole.
    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let logger = self.app.logger.child("stdio");
        let writer_logger = logger.clone();
        let writer = tokio::spawn(async move {
            let mut writer = BufWriter::new(stdout);
            while let Some(response) = rx.recv().await {
                let payload = match serde_json::to_string(&response) {
                    Ok(payload) => payload,
                    Err(err) => {
                        writer_logger.error(
                            "Failed to encode response",
                            Some(&serde_json::json!({ "error": err.to_string() })),
                        );
                        continue;
                    }
                };
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        while let Some(line) = reader.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let request = match Self::parse_line(trimmed) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };
            if request.method == "tools/call" {
                let server = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = server.handle_request(request).await {
                        let _ = tx.send(response);
                    }
                });
                continue;
            }
            if let Some(response) = self.handle_request(request).await {
                let _ = tx.send(response);
            }
        }

        drop(tx);
        writer
            .await
            .map_err(|err| ToolError::internal(format!("Writer task failed: {}", err)))??;
        logger.info(
            "stdin closed",
            Some(&serde_json::json!({
                "audit": self.app.request_log.stats(),
                "diagnostics": self.app.logger.stats(),
            })),
        );
        Ok(())
    }
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let server = McpServer::new()?;
    server.run_stdio().await
}
