use crate::constants::network::DEFAULT_TIMEOUT_SECS;
use crate::errors::ToolError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Normalizes a tool's JSON argument bag into executor inputs.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    /// Required string argument. Only the type is checked; an empty value is
    /// passed through so it fails, and is logged, as a malformed request.
    pub fn required_string(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        value
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ToolError::invalid_params(format!(
                    "{} parameter is required and must be a string",
                    label
                ))
            })
    }

    /// Optional string argument; anything that is not a string counts as absent.
    pub fn optional_string(&self, value: Option<&Value>) -> Option<String> {
        value.and_then(Value::as_str).map(str::to_string)
    }

    /// String-to-string mapping. Entries whose value is not a string are
    /// dropped, as is a non-object argument.
    pub fn string_map(&self, value: Option<&Value>) -> BTreeMap<String, String> {
        value
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(key, val)| val.as_str().map(|s| (key.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Timeout in seconds; defaults to 30 when absent or null.
    pub fn timeout(&self, value: Option<&Value>) -> Result<Duration, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS));
        };
        let seconds = value
            .as_f64()
            .ok_or_else(|| ToolError::invalid_params("timeout must be a number of seconds"))?;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ToolError::invalid_params(
                "timeout must be a positive number of seconds",
            ));
        }
        Duration::try_from_secs_f64(seconds)
            .map_err(|_| ToolError::invalid_params("timeout is out of range"))
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
