use crate::constants::audit::{
    ERROR_STATUS, FILE_PREFIX, FILE_SUFFIX, FILE_TIMESTAMP_FORMAT,
};
use crate::errors::ToolError;
use crate::services::http_executor::{Outcome, RequestDescriptor};
use crate::services::logger::Logger;
use crate::utils::paths::resolve_log_dir;
use crate::utils::text::content_preview;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Where an audit entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogLocation(PathBuf);

impl LogLocation {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for LogLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// `status_code` in the response summary: the numeric code, or the literal
/// `"ERROR"` for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    Code(u16),
    Error,
}

impl Serialize for StatusField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatusField::Code(code) => serializer.serialize_u16(*code),
            StatusField::Error => serializer.serialize_str(ERROR_STATUS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub body: String,
    pub body_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub status_code: StatusField,
    pub headers: BTreeMap<String, String>,
    pub content_length: usize,
    pub content_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_status_code: Option<u16>,
}

/// One line of the audit file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub request: RequestSummary,
    pub response: ResponseSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn from_attempt(descriptor: &RequestDescriptor, outcome: &Outcome<'_>) -> Self {
        let request = RequestSummary {
            method: descriptor.method.clone(),
            url: descriptor.url.clone(),
            headers: descriptor.headers.clone(),
            cookies: descriptor.cookies.clone(),
            body: descriptor.body.clone(),
            body_length: descriptor.body.len(),
        };
        let (response, error) = match outcome {
            Outcome::Success {
                status,
                headers,
                body,
            } => (
                ResponseSummary {
                    status_code: StatusField::Code(*status),
                    headers: (*headers).clone(),
                    content_length: body.len(),
                    content_preview: content_preview(body),
                    partial_status_code: None,
                },
                None,
            ),
            // A failed attempt never reports response data, whatever was received.
            Outcome::Failure {
                error,
                partial_status,
            } => (
                ResponseSummary {
                    status_code: StatusField::Error,
                    headers: BTreeMap::new(),
                    content_length: 0,
                    content_preview: String::new(),
                    partial_status_code: *partial_status,
                },
                Some(error.clone()),
            ),
        };
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            request,
            response,
            error,
        }
    }

    /// Serializes section by section. A section that cannot be serialized is
    /// left out; the names of such sections are returned alongside the line.
    pub fn to_line(&self) -> (String, Vec<&'static str>) {
        let mut omitted = Vec::new();
        let mut map = serde_json::Map::new();
        map.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        match serde_json::to_value(&self.request) {
            Ok(value) => {
                map.insert("request".to_string(), value);
            }
            Err(_) => omitted.push("request"),
        }
        match serde_json::to_value(&self.response) {
            Ok(value) => {
                map.insert("response".to_string(), value);
            }
            Err(_) => omitted.push("response"),
        }
        if let Some(error) = &self.error {
            map.insert("error".to_string(), Value::String(error.clone()));
        }
        (Value::Object(map).to_string(), omitted)
    }
}

/// Append-only audit sink for the lifetime of the process.
///
/// Opened once at startup; every HTTP attempt goes through [`RequestLog::record`].
#[derive(Debug)]
pub struct RequestLog {
    logger: Logger,
    path: PathBuf,
    file: Mutex<File>,
    logged: AtomicU64,
    errors: AtomicU64,
}

impl RequestLog {
    /// Creates `dir` if needed and opens a file named after the current time.
    pub fn open(logger: Logger, dir: &Path) -> Result<Self, ToolError> {
        std::fs::create_dir_all(dir).map_err(|err| {
            ToolError::internal(format!(
                "Failed to create log directory {}: {}",
                dir.display(),
                err
            ))
        })?;
        let file_name = format!(
            "{}{}{}",
            FILE_PREFIX,
            chrono::Local::now().format(FILE_TIMESTAMP_FORMAT),
            FILE_SUFFIX
        );
        let path = dir.join(file_name);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                ToolError::internal(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    err
                ))
            })?;
        let logger = logger.child("audit");
        logger.info(
            "Audit log opened",
            Some(&serde_json::json!({ "path": path })),
        );
        Ok(Self {
            logger,
            path,
            file: Mutex::new(file),
            logged: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        })
    }

    /// Opens the log in the configured directory (see [`resolve_log_dir`]).
    pub fn open_default(logger: Logger) -> Result<Self, ToolError> {
        let dir = resolve_log_dir().ok_or_else(|| {
            ToolError::internal("Failed to resolve user home directory").with_hint(
                "Set HOME or HTTP_REQUESTS_LOG_DIR to choose where requests are logged.",
            )
        })?;
        Self::open(logger, &dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, descriptor: &RequestDescriptor, outcome: &Outcome<'_>) -> LogLocation {
        self.append(&AuditEntry::from_attempt(descriptor, outcome))
    }

    /// Writes one entry as a single line. Failures are counted and reported on
    /// stderr; the caller always gets the location back.
    pub fn append(&self, entry: &AuditEntry) -> LogLocation {
        let (line, omitted) = entry.to_line();
        if !omitted.is_empty() {
            self.logger.warn(
                "Audit entry sections omitted",
                Some(&serde_json::json!({ "sections": omitted })),
            );
        }
        let payload = format!("{}\n", line);
        let result = {
            let mut file = self.file.lock().unwrap_or_else(|err| err.into_inner());
            file.write_all(payload.as_bytes())
                .and_then(|_| file.flush())
        };
        match result {
            Ok(()) => {
                self.logged.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                self.logger.warn(
                    "Audit write failed",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
            }
        }
        LogLocation(self.path.clone())
    }

    pub fn stats(&self) -> Value {
        serde_json::json!({
            "logged": self.logged.load(Ordering::Relaxed),
            "errors": self.errors.load(Ordering::Relaxed),
            "path": self.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descriptor(body: &str) -> RequestDescriptor {
        RequestDescriptor {
            method: "POST".to_string(),
            url: "http://example.test/submit".to_string(),
            headers: BTreeMap::from([("X-Test".to_string(), "v".to_string())]),
            cookies: BTreeMap::from([("s".to_string(), "1".to_string())]),
            body: body.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn failure_entries_carry_error_marker_and_no_response_data() {
        let entry = AuditEntry::from_attempt(
            &descriptor(""),
            &Outcome::Failure {
                error: "connection refused".to_string(),
                partial_status: None,
            },
        );
        let (line, omitted) = entry.to_line();
        assert!(omitted.is_empty());
        let parsed: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(parsed["response"]["status_code"], "ERROR");
        assert_eq!(parsed["response"]["headers"], serde_json::json!({}));
        assert_eq!(parsed["response"]["content_length"], 0);
        assert_eq!(parsed["response"]["content_preview"], "");
        assert!(parsed["response"].get("partial_status_code").is_none());
        assert_eq!(parsed["error"], "connection refused");
    }

    #[test]
    fn read_failures_keep_the_partial_status_beside_the_marker() {
        let entry = AuditEntry::from_attempt(
            &descriptor(""),
            &Outcome::Failure {
                error: "body cut short".to_string(),
                partial_status: Some(200),
            },
        );
        let parsed: Value = serde_json::from_str(&entry.to_line().0).expect("valid json");
        assert_eq!(parsed["response"]["status_code"], "ERROR");
        assert_eq!(parsed["response"]["partial_status_code"], 200);
    }

    #[test]
    fn success_entries_echo_request_and_truncate_preview() {
        let body = "z".repeat(750);
        let headers = BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]);
        let entry = AuditEntry::from_attempt(
            &descriptor("{\"a\":1}"),
            &Outcome::Success {
                status: 201,
                headers: &headers,
                body: &body,
            },
        );
        let parsed: Value = serde_json::from_str(&entry.to_line().0).expect("valid json");
        assert_eq!(parsed["request"]["method"], "POST");
        assert_eq!(parsed["request"]["headers"]["X-Test"], "v");
        assert_eq!(parsed["request"]["cookies"]["s"], "1");
        assert_eq!(parsed["request"]["body_length"], 7);
        assert_eq!(parsed["response"]["status_code"], 201);
        assert_eq!(parsed["response"]["content_length"], 750);
        assert_eq!(
            parsed["response"]["content_preview"],
            format!("{}...", "z".repeat(500))
        );
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn serializing_an_entry_twice_is_stable() {
        let headers = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let entry = AuditEntry::from_attempt(
            &descriptor("payload"),
            &Outcome::Success {
                status: 200,
                headers: &headers,
                body: "ok",
            },
        );
        assert_eq!(entry.to_line().0, entry.to_line().0);
    }
}
