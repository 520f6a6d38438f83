//! Error types for activity telemetry

use thiserror::Error;

/// Result type for telemetry operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur while configuring the tracker or writing to a sink
///
/// None of these ever escape [`ActivityTracker::track`](crate::ActivityTracker::track);
/// sink failures stop at the transport boundary.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Activity name outside the closed set
    #[error("Unknown activity type: {0}")]
    UnknownActivityType(String),

    /// No tokio runtime available to run sink writes on
    #[error("No tokio runtime available. Construct the tracker inside a runtime or pass a handle.")]
    NoRuntime,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sink could not be reached
    #[error("Sink unreachable: {0}")]
    SinkUnreachable(String),

    /// Sink answered but refused the record
    #[error("Sink rejected record ({status}): {message}")]
    SinkRejected { status: u16, message: String },

    /// Sink write did not settle in time
    #[error("Sink write timed out after {0} ms")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            TrackerError::SinkRejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            TrackerError::SinkUnreachable(e.to_string())
        }
    }
}
