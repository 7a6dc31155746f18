pub mod network {
    pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
    pub const DEFAULT_METHOD: &str = "GET";
    pub const MAX_REDIRECTS: usize = 10;
}

pub mod audit {
    pub const LOG_DIR_NAME: &str = "mcp_requests_logs";
    pub const LOG_DIR_ENV: &str = "HTTP_REQUESTS_LOG_DIR";
    pub const FILE_PREFIX: &str = "requests_";
    pub const FILE_SUFFIX: &str = ".log";
    pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
    pub const PREVIEW_CHARS: usize = 500;
    pub const TRUNCATION_MARKER: &str = "...";
    pub const ERROR_STATUS: &str = "ERROR";
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http:", "https:"];
}

pub mod server {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const NAME: &str = "http-requests";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub mod tools {
    pub const VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];
    pub const BODYLESS_VERBS: &[&str] = &["HEAD", "OPTIONS"];
    pub const RAW_REQUEST: &str = "http_raw_request";
}
