use thiserror::Error;

/// Failures raised by the exchange runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config: {0}")]
    Config(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport: {0}")]
    Transport(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Decode failures are reported to the stream reader; everything else is a
    /// producer-side fault that only ends the stream.
    pub fn is_decode(&self) -> bool {
        matches!(self, RuntimeError::Decode(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RuntimeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Utf8 => RuntimeError::Decode("frame is not valid utf-8".to_string()),
            other => RuntimeError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decode_errors_reach_the_reader() {
        assert!(RuntimeError::Decode("bad".into()).is_decode());
        assert!(!RuntimeError::Transport("reset".into()).is_decode());
        assert!(!RuntimeError::Unsupported("fills".into()).is_decode());
    }

    #[test]
    fn utf8_frame_errors_map_to_decode() {
        let err: RuntimeError = tokio_tungstenite::tungstenite::Error::Utf8.into();
        assert!(err.is_decode());
        let err: RuntimeError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, RuntimeError::Transport(_)));
    }
}
