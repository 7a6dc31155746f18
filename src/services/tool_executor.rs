use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{McpError, ToolError};
use crate::mcp::catalog::validate_tool_args;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Text payload of a `tools/call` result.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(result: &Value) -> Self {
        Self {
            text: serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string()),
            is_error: false,
        }
    }

    pub fn failure(error: &ToolError) -> Self {
        Self {
            text: error.to_text(),
            is_error: true,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "content": [ { "type": "text", "text": self.text } ],
            "isError": self.is_error,
        })
    }
}

/// Routes a tool call to its handler. Handler failures come back as error
/// results rather than protocol faults, so the caller always gets an answer.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    fn unknown_tool(&self, tool: &str) -> McpError {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        let suggestions = suggest(tool, &names, 3);
        let mut err = McpError::unknown_tool(tool);
        if !suggestions.is_empty() {
            err.message = format!("{}. Did you mean: {}?", err.message, suggestions.join(", "));
        }
        err
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<ToolCallResult, McpError> {
        let handler = self.handlers.get(tool).ok_or_else(|| self.unknown_tool(tool))?;
        if let Err(err) = validate_tool_args(tool, &args) {
            self.logger.debug(
                "Rejected tool arguments",
                Some(&serde_json::json!({ "tool": tool, "error": err.message })),
            );
            return Ok(ToolCallResult::failure(&err));
        }

        let started = Instant::now();
        let result = handler.handle(args).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                self.logger.debug(
                    "Tool call finished",
                    Some(&serde_json::json!({ "tool": tool, "duration_ms": duration_ms })),
                );
                Ok(ToolCallResult::success(&value))
            }
            Err(err) => {
                self.logger.info(
                    "Tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "kind": err.kind,
                        "code": err.code,
                        "duration_ms": duration_ms,
                    })),
                );
                Ok(ToolCallResult::failure(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Value) -> Result<Value, ToolError> {
            if args.get("fail").is_some() {
                return Err(ToolError::network("connection refused"));
            }
            Ok(args)
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("echo".to_string(), Arc::new(Echo));
        ToolExecutor::new(Logger::new("test"), handlers)
    }

    #[tokio::test]
    async fn handler_errors_become_error_results() {
        let result = executor()
            .execute("echo", serde_json::json!({"fail": true}))
            .await
            .expect("not a protocol error");
        assert!(result.is_error);
        assert_eq!(result.text, "Error: connection refused");
        assert_eq!(result.to_value()["isError"], true);
    }

    #[tokio::test]
    async fn successful_results_are_pretty_json() {
        let result = executor()
            .execute("echo", serde_json::json!({"a": 1}))
            .await
            .expect("ok");
        assert!(!result.is_error);
        assert_eq!(result.text, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn unknown_tools_are_protocol_errors() {
        let err = executor()
            .execute("ecoh", Value::Null)
            .await
            .expect_err("unknown");
        assert!(err.message.starts_with("Unknown tool: ecoh"));
    }
}
