pub mod http;
pub mod raw;
