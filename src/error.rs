use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Malformed detection input for a single face.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("landmark set is empty")]
    Empty,

    #[error("expected {expected} landmarks, got {got}")]
    WrongCount { expected: usize, got: usize },

    #[error("landmark coordinate {value} at index {index} does not fit in {width} bits")]
    CoordinateOutOfRange { index: usize, value: i32, width: u32 },
}

/// Failure of an external logging or notification sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink rejected the event: {0}")]
    Rejected(String),

    #[error("sink did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("sink queue is full")]
    Busy,

    #[error("sink worker has stopped")]
    Disconnected,

    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum MonitorError {
    /// The capture device could not be opened; the loop never starts.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
