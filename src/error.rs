//! Error types for Framecast

use thiserror::Error;

/// Result type alias for Framecast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Framecast error type
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Encoder errors
    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    // Output errors
    #[error("Muxer error: {0}")]
    Muxer(String),

    #[error("RTMP error: {0}")]
    Rtmp(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // Session errors
    #[error("Session closed")]
    SessionClosed,

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error should trigger a session teardown and reconnect
    /// rather than aborting the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EncoderInit(_)
                | Error::EncodingFailed(_)
                | Error::Muxer(_)
                | Error::Rtmp(_)
                | Error::ConnectionFailed(_)
                | Error::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_not_recoverable() {
        assert!(!Error::Config("missing url".into()).is_recoverable());
        assert!(!Error::SessionClosed.is_recoverable());
    }

    #[test]
    fn session_errors_are_recoverable() {
        assert!(Error::Rtmp("broken pipe".into()).is_recoverable());
        assert!(Error::EncodingFailed("send_frame".into()).is_recoverable());
        assert!(Error::ConnectionFailed("refused".into()).is_recoverable());
    }
}
