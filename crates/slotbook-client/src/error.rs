//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that stop the CLI before or after a scheduling run.
///
/// Failures inside a run are reported through the run's outcome instead.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// A secret reference could not be resolved.
    Secret(String),
    /// Invalid command-line input.
    Usage(String),
    /// Provider error.
    Provider(String),
    /// Slot search failed.
    Search(slotbook_engine::SchedulingError),
    /// IO error.
    Io(std::io::Error),
    /// Output could not be serialized.
    Output(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Secret(msg) => write!(f, "secret error: {}", msg),
            Self::Usage(msg) => write!(f, "invalid arguments: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Search(err) => write!(f, "{} ({})", err, err.code()),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Output(msg) => write!(f, "output error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Search(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<slotbook_engine::SchedulingError> for ClientError {
    fn from(err: slotbook_engine::SchedulingError) -> Self {
        Self::Search(err)
    }
}

impl From<slotbook_providers::ProviderError> for ClientError {
    fn from(err: slotbook_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
