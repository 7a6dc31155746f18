use crate::constants::server::NAME;
use crate::constants::tools::{BODYLESS_VERBS, RAW_REQUEST, VERBS};
use crate::errors::ToolError;
use crate::managers::http::HttpVerbManager;
use crate::managers::raw::RawRequestManager;
use crate::mcp::catalog::{tool_catalog, verb_tool_name};
use crate::services::http_executor::HttpExecutor;
use crate::services::logger::Logger;
use crate::services::request_log::RequestLog;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub request_log: Arc<RequestLog>,
    pub http_executor: Arc<HttpExecutor>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in the catalog must have a registered handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    /// Opens the audit log in the configured directory and wires every tool.
    /// Failing to open the log is fatal.
    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new(NAME);
        let request_log = Arc::new(RequestLog::open_default(logger.clone())?);
        Self::with_request_log(logger, request_log)
    }

    pub fn with_request_log(
        logger: Logger,
        request_log: Arc<RequestLog>,
    ) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let http_executor = Arc::new(HttpExecutor::new(logger.clone(), request_log.clone())?);

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for &method in VERBS {
            let manager = HttpVerbManager::new(
                logger.clone(),
                validation.clone(),
                http_executor.clone(),
                method,
                !BODYLESS_VERBS.contains(&method),
            );
            handlers.insert(verb_tool_name(method), Arc::new(manager));
        }
        handlers.insert(
            RAW_REQUEST.to_string(),
            Arc::new(RawRequestManager::new(
                logger.clone(),
                validation,
                http_executor.clone(),
            )),
        );

        Self::validate_tool_wiring(&handlers)?;

        logger.info(
            "Server ready",
            Some(&serde_json::json!({
                "tools": handlers.len(),
                "log_file": request_log.path(),
            })),
        );

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        Ok(Self {
            logger,
            request_log,
            http_executor,
            tool_executor,
        })
    }
}
