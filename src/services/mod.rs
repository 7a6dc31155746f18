pub mod http_executor;
pub mod logger;
pub mod request_log;
pub mod tool_executor;
pub mod validation;
