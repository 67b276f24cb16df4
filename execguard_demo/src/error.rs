use thiserror::Error;

/// Every failure the gateway reports to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecGuardError {
    #[error("unsupported exchange: {0}")]
    UnsupportedExchange(String),

    #[error("unsupported datastream: {0}")]
    UnsupportedDatastream(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("not armed: set XWS_EXEC_ARM=1 to allow {0} execution")]
    NotArmed(String),

    #[error("limit orders require price")]
    PriceRequired,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("runtime call failed: {0}")]
    RuntimeCallFailed(String),

    #[error("stream read failed: {0}")]
    StreamReadFailed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedExchange,
    UnsupportedDatastream,
    InvalidParameters,
    MissingCredentials,
    NotArmed,
    PriceRequired,
    ConnectionFailed,
    RuntimeCallFailed,
    StreamReadFailed,
}

impl ExecGuardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecGuardError::UnsupportedExchange(_) => ErrorKind::UnsupportedExchange,
            ExecGuardError::UnsupportedDatastream(_) => ErrorKind::UnsupportedDatastream,
            ExecGuardError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            ExecGuardError::MissingCredentials(_) => ErrorKind::MissingCredentials,
            ExecGuardError::NotArmed(_) => ErrorKind::NotArmed,
            ExecGuardError::PriceRequired => ErrorKind::PriceRequired,
            ExecGuardError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            ExecGuardError::RuntimeCallFailed(_) => ErrorKind::RuntimeCallFailed,
            ExecGuardError::StreamReadFailed(_) => ErrorKind::StreamReadFailed,
        }
    }
}

pub type GuardResult<T> = std::result::Result<T, ExecGuardError>;

/// Collapses a multi-line error message onto one line.
pub fn one_line(err: &dyn std::fmt::Display) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
