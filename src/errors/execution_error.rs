use thiserror::Error;

/// Failure of a single HTTP attempt after input validation succeeded.
///
/// Every variant has already been written to the audit log by the time the
/// executor hands it back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The method, URL or a header could not form a request.
    #[error("{0}")]
    Construction(String),

    /// DNS, connect, TLS or protocol failure before a response arrived.
    #[error("{0}")]
    Network(String),

    /// The per-request deadline elapsed.
    #[error("{0}")]
    Timeout(String),

    /// Headers arrived but the body could not be read.
    #[error("{message}")]
    Read { status: u16, message: String },
}

impl ExecutionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ExecutionError::Read { status, .. } => Some(*status),
            _ => None,
        }
    }
}
