#![allow(dead_code)]

use http_requests::app::App;
use http_requests::services::logger::Logger;
use http_requests::services::request_log::RequestLog;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn tmp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}

/// App wired against a fresh audit directory.
pub fn test_app(prefix: &str) -> Arc<App> {
    let logger = Logger::new("test");
    let log = RequestLog::open(logger.clone(), &tmp_dir(prefix)).expect("open request log");
    Arc::new(App::with_request_log(logger, Arc::new(log)).expect("app"))
}

/// Every audit line written so far, parsed.
pub fn audit_lines(app: &App) -> Vec<Value> {
    let raw = std::fs::read_to_string(app.request_log.path()).unwrap_or_default();
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("audit line is json"))
        .collect()
}
