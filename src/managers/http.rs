use crate::errors::ToolError;
use crate::services::http_executor::{HttpExecutor, RequestDescriptor};
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use serde_json::Value;
use std::sync::Arc;

/// Handler behind one fixed-verb tool (`http_get`, `http_post`, ...).
#[derive(Clone)]
pub struct HttpVerbManager {
    logger: Logger,
    validation: Validation,
    executor: Arc<HttpExecutor>,
    method: &'static str,
    accepts_body: bool,
}

impl HttpVerbManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        executor: Arc<HttpExecutor>,
        method: &'static str,
        accepts_body: bool,
    ) -> Self {
        Self {
            logger: logger.child(&method.to_lowercase()),
            validation,
            executor,
            method,
            accepts_body,
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Normalizes the argument bag. Rejections here happen before any network
    /// activity and leave no audit entry.
    pub fn descriptor(&self, args: &Value) -> Result<RequestDescriptor, ToolError> {
        let url = self
            .validation
            .required_string(args.get("url"), "url")?;
        let body = if self.accepts_body {
            self.validation
                .optional_string(args.get("body"))
                .unwrap_or_default()
        } else {
            String::new()
        };
        Ok(RequestDescriptor::new(self.method, url)
            .with_headers(self.validation.string_map(args.get("headers")))
            .with_cookies(self.validation.string_map(args.get("cookies")))
            .with_body(body)
            .with_timeout(self.validation.timeout(args.get("timeout"))?))
    }

    pub async fn request(&self, args: Value) -> Result<Value, ToolError> {
        let descriptor = self.descriptor(&args)?;
        self.logger.debug(
            "request",
            Some(&serde_json::json!({ "url": descriptor.url })),
        );
        let envelope = self.executor.execute(descriptor).await?;
        serde_json::to_value(&envelope)
            .map_err(|err| ToolError::internal(format!("Failed to serialize result: {}", err)))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for HttpVerbManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.request(args).await
    }
}
