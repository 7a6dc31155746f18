use crate::constants::network::DEFAULT_METHOD;
use crate::errors::ToolError;
use crate::services::http_executor::{HttpExecutor, RequestDescriptor, ResultEnvelope};
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// `raw_body` as the caller sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    String(String),
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Other(Value),
}

impl RawBody {
    /// Absent and `null` both mean an empty body.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawBody::String(String::new()),
            Some(Value::String(text)) => RawBody::String(text.clone()),
            Some(Value::Object(map)) => RawBody::Object(map.clone()),
            Some(Value::Array(items)) => RawBody::Array(items.clone()),
            Some(other) => RawBody::Other(other.clone()),
        }
    }

    /// Body text to send, plus a warning when the value had to be converted.
    /// Only a string is sent untouched; structured values become canonical
    /// JSON text and scalars their JSON rendering.
    pub fn into_text(self) -> (String, Option<String>) {
        match self {
            RawBody::String(text) => (text, None),
            RawBody::Object(map) => (
                Value::Object(map).to_string(),
                Some(conversion_warning("Object", "JSON string")),
            ),
            RawBody::Array(items) => (
                Value::Array(items).to_string(),
                Some(conversion_warning("Array", "JSON string")),
            ),
            RawBody::Other(value) => {
                let kind = match value {
                    Value::Bool(_) => "boolean",
                    Value::Number(_) => "number",
                    _ => "value",
                };
                (value.to_string(), Some(conversion_warning(kind, "string")))
            }
        }
    }
}

fn conversion_warning(from: &str, to: &str) -> String {
    format!("⚠️ AUTO-CONVERTED: {} → {}", from, to)
}

#[derive(Debug, Serialize)]
pub struct RawRequestResult {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_warning: Option<String>,
}

/// Handler behind `http_raw_request`: caller-chosen method, body sent as given.
#[derive(Clone)]
pub struct RawRequestManager {
    logger: Logger,
    validation: Validation,
    executor: Arc<HttpExecutor>,
}

impl RawRequestManager {
    pub fn new(logger: Logger, validation: Validation, executor: Arc<HttpExecutor>) -> Self {
        Self {
            logger: logger.child("raw"),
            validation,
            executor,
        }
    }

    pub fn descriptor(&self, args: &Value) -> Result<(RequestDescriptor, Option<String>), ToolError> {
        let url = self
            .validation
            .required_string(args.get("url"), "url")?;
        let method = self
            .validation
            .optional_string(args.get("method"))
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());
        let (body, warning) = RawBody::from_value(args.get("raw_body")).into_text();
        let descriptor = RequestDescriptor::new(&method, url)
            .with_headers(self.validation.string_map(args.get("headers")))
            .with_cookies(self.validation.string_map(args.get("cookies")))
            .with_body(body)
            .with_timeout(self.validation.timeout(args.get("timeout"))?);
        Ok((descriptor, warning))
    }

    pub async fn request(&self, args: Value) -> Result<Value, ToolError> {
        let (descriptor, conversion_warning) = self.descriptor(&args)?;
        if let Some(warning) = conversion_warning.as_ref() {
            self.logger.info(
                "raw_body coerced",
                Some(&serde_json::json!({ "warning": warning })),
            );
        }
        let envelope = self.executor.execute(descriptor).await?;
        serde_json::to_value(RawRequestResult {
            envelope,
            conversion_warning,
        })
        .map_err(|err| ToolError::internal(format!("Failed to serialize result: {}", err)))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for RawRequestManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.request(args).await
    }
}
