use crate::constants::tools::{BODYLESS_VERBS, RAW_REQUEST, VERBS};
use crate::errors::ToolError;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

const RAW_REQUEST_DESCRIPTION: &str = r#"🔒 CRITICAL SECURITY TESTING TOOL: Sends HTTP requests with ABSOLUTE PRECISION - All requests logged

⚠️  IMPORTANT: This tool preserves EVERY SINGLE CHARACTER of your request:
- Headers: Every cookie, token, session ID - NO CHARACTER LIMIT, NO TRUNCATION
- Body: Raw payload sent byte-for-byte, preserving payloads exactly
- Cookies: Complete cookie strings including long JWT tokens, session data
- Special characters: ', ", \, %, &, =, etc. are preserved without encoding
- Whitespace: Spaces, tabs, newlines maintained exactly as provided

🎯 Perfect for: all kinds of security vulnerability testing, testing like SQL injection, XSS, CSRF, authentication bypass, parameter pollution
📝 Guarantee: What you input is EXACTLY what gets sent - zero modifications
📊 All requests and responses are automatically logged to ~/mcp_requests_logs/

💡 USAGE TIP: raw_body must be a STRING, not an object. For JSON, use: '{"key":"value"}' not {"key":"value"}"#;

pub fn verb_tool_name(method: &str) -> String {
    format!("http_{}", method.to_lowercase())
}

fn common_properties() -> serde_json::Map<String, Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "url".to_string(),
        json!({"type": "string", "description": "The URL to send the request to"}),
    );
    props.insert(
        "headers".to_string(),
        json!({"type": "object", "description": "Optional headers to include in the request"}),
    );
    props.insert(
        "cookies".to_string(),
        json!({"type": "object", "description": "Optional cookies to include in the request"}),
    );
    props.insert(
        "timeout".to_string(),
        json!({
            "type": "number",
            "exclusiveMinimum": 0,
            "description": "Request timeout in seconds, must be > 0 (default: 30)"
        }),
    );
    props
}

fn verb_tool(method: &str) -> ToolDef {
    let bodyless = BODYLESS_VERBS.contains(&method);
    let mut props = common_properties();
    let description = if bodyless {
        format!(
            "HTTP {} request with full support (headers, cookies, timeout) - All requests logged",
            method
        )
    } else {
        props.insert(
            "body".to_string(),
            json!({"type": "string", "description": "Optional body content for the request"}),
        );
        format!(
            "HTTP {} request with full support (headers, cookies, body, timeout) - All requests logged",
            method
        )
    };
    ToolDef {
        name: verb_tool_name(method),
        description,
        input_schema: json!({
            "type": "object",
            "properties": props,
            "required": ["url"],
        }),
    }
}

fn raw_request_tool() -> ToolDef {
    let mut props = common_properties();
    props.insert(
        "method".to_string(),
        json!({"type": "string", "description": "HTTP method (default: GET)"}),
    );
    // Structured values are accepted and coerced, so no type is pinned here.
    props.insert(
        "raw_body".to_string(),
        json!({"description": "Raw body content - preserved exactly as provided"}),
    );
    ToolDef {
        name: RAW_REQUEST.to_string(),
        description: RAW_REQUEST_DESCRIPTION.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": props,
            "required": ["url"],
        }),
    }
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let mut tools: Vec<ToolDef> = VERBS.iter().map(|method| verb_tool(method)).collect();
    tools.push(raw_request_tool());
    tools
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

/// Checks `args` against the tool's input schema. Tools outside the catalog
/// are not checked.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let rendered: Vec<String> = errors
            .take(10)
            .map(|err| {
                let path = err.instance_path.to_string();
                let path = if path.is_empty() {
                    "(root)".to_string()
                } else {
                    path
                };
                format!("{}: {}", path, err)
            })
            .collect();
        return Err(ToolError::invalid_params(format!(
            "Invalid arguments for {}: {}",
            tool_name,
            rendered.join("; ")
        ))
        .with_details(json!({ "errors": rendered })));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_verb_and_the_raw_tool() {
        let names: Vec<&str> = tool_catalog().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "http_get",
                "http_post",
                "http_put",
                "http_delete",
                "http_patch",
                "http_head",
                "http_options",
                "http_raw_request",
            ]
        );
    }

    #[test]
    fn bodyless_verbs_have_no_body_property() {
        for name in ["http_head", "http_options"] {
            let tool = tool_by_name(name).expect("tool");
            assert!(tool.input_schema["properties"].get("body").is_none());
            assert!(!tool.description.contains("body"));
        }
        let post = tool_by_name("http_post").expect("tool");
        assert_eq!(post.input_schema["properties"]["body"]["type"], "string");
    }

    #[test]
    fn missing_url_fails_validation() {
        let err = validate_tool_args("http_get", &json!({})).expect_err("url required");
        assert!(err.message.contains("url"));
        assert!(validate_tool_args("http_get", &json!({"url": "http://x"})).is_ok());
    }

    #[test]
    fn raw_body_accepts_any_shape() {
        for body in [json!("text"), json!({"a": 1}), json!([1]), json!(3)] {
            assert!(validate_tool_args(
                "http_raw_request",
                &json!({"url": "http://x", "raw_body": body})
            )
            .is_ok());
        }
    }

    #[test]
    fn timeouts_must_be_positive() {
        for tool in tool_catalog() {
            let timeout = &tool.input_schema["properties"]["timeout"];
            assert!(
                timeout["description"].as_str().unwrap_or("").contains("must be > 0"),
                "{}",
                tool.name
            );
        }
        assert!(validate_tool_args("http_get", &json!({"url": "http://x", "timeout": 0})).is_err());
        assert!(validate_tool_args("http_get", &json!({"url": "http://x", "timeout": -2})).is_err());
        assert!(validate_tool_args("http_get", &json!({"url": "http://x", "timeout": 0.5})).is_ok());
    }

    #[test]
    fn wrongly_typed_optional_fields_are_rejected() {
        assert!(validate_tool_args("http_get", &json!({"url": "http://x", "timeout": "5"})).is_err());
        assert!(validate_tool_args("http_post", &json!({"url": "http://x", "body": {"a": 1}})).is_err());
    }
}
