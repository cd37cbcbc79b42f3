use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TrackError {
    #[error("lapjv error: {0}")]
    LapjvError(String),
    #[error("assignment error: {0}")]
    AssignmentError(String),
    #[error("byte tracker error: {0}")]
    ByteTrackerError(String),
    #[error("invalid detection: {0}")]
    InvalidDetection(String),
    #[error("invalid config: {0}")]
    ConfigError(String),
}
