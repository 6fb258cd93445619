//! Error types for the daytag engine.
//!
//! The tagging engine itself never fails; these errors come from the edges
//! around it (configuration, ICS files, recurrence rules).

use thiserror::Error;

/// Errors that can occur while loading or expanding calendar data.
#[derive(Error, Debug)]
pub enum DayTagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for daytag operations.
pub type DayTagResult<T> = Result<T, DayTagError>;
