//! Error types for the CGT client

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for CGT client operations
pub type Result<T> = std::result::Result<T, CgtError>;

/// CGT client error types
#[derive(Debug, Error)]
pub enum CgtError {
    /// Engine executable missing or not launchable
    #[error("Spawn error: {0}")]
    Spawn(String),

    /// Engine input channel closed or broken
    #[error("Write error: {0}")]
    Write(String),

    /// Engine output channel closed or broken
    #[error("Read error: {0}")]
    Read(String),

    /// Response is not a complete line
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Response line is not a valid game value
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Request parameters violate a structural invariant
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Call made on a session that is not open
    #[error("Invalid state: session is {0}")]
    InvalidState(String),

    /// Engine answered with its own failure marker
    #[error("Engine error: {0}")]
    Engine(EngineFailure),

    /// Invalid session configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No response line within the configured read timeout
    #[error("Timed out after {0:?} waiting for engine response")]
    Timeout(Duration),
}

impl CgtError {
    /// Whether the session that produced this error must be discarded.
    ///
    /// Pipe failures, framing failures and timeouts leave the engine in an
    /// unknown state. Encoding, decoding and engine-reported failures abort
    /// only the current call.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            CgtError::Spawn(_)
                | CgtError::Write(_)
                | CgtError::Read(_)
                | CgtError::Protocol(_)
                | CgtError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for CgtError {
    fn from(err: serde_json::Error) -> Self {
        CgtError::Decoding(err.to_string())
    }
}

/// Failure markers the engine prints in place of a response object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailure {
    /// Engine could not decode the request line
    Decoding,
    /// Engine rejected the position described by the request
    Parsing,
}

impl EngineFailure {
    /// Recognize a marker line, ignoring surrounding whitespace
    pub fn from_marker(line: &str) -> Option<Self> {
        match line.trim() {
            "Decoding" => Some(EngineFailure::Decoding),
            "Parsing" => Some(EngineFailure::Parsing),
            _ => None,
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFailure::Decoding => write!(f, "engine could not decode the request"),
            EngineFailure::Parsing => write!(f, "engine rejected the position"),
        }
    }
}
