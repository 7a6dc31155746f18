mod execution_error;
mod mcp_error;
mod tool_error;

pub use execution_error::ExecutionError;
pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::{ToolError, ToolErrorKind};
