use crate::constants::audit::{LOG_DIR_ENV, LOG_DIR_NAME};
use std::env;
use std::path::{Path, PathBuf};

fn normalize_env_path(value: Option<String>) -> Option<PathBuf> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(expand_home_path(trimmed))
}

fn resolve_home_dir() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .or_else(|| env::var("USERPROFILE").ok())
        .filter(|home| !home.trim().is_empty())
        .map(PathBuf::from)
}

pub fn expand_home_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if let Some(str_path) = path.to_str() {
        if let Some(rest) = str_path.strip_prefix("~/") {
            if let Some(home) = resolve_home_dir() {
                return home.join(rest);
            }
        }
        if str_path == "~" {
            if let Some(home) = resolve_home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Directory holding the per-run audit files.
///
/// `HTTP_REQUESTS_LOG_DIR` wins when set; otherwise `~/mcp_requests_logs`.
/// `None` means there is no home directory to fall back on.
pub fn resolve_log_dir() -> Option<PathBuf> {
    if let Some(path) = normalize_env_path(env::var(LOG_DIR_ENV).ok()) {
        return Some(path);
    }
    resolve_home_dir().map(|home| home.join(LOG_DIR_NAME))
}
