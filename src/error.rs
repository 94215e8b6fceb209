//! Unified error handling for the run-tracker library.
//!
//! Invalid GPS fixes are not errors: they are reported as
//! [`RejectReason`](crate::recorder::RejectReason) data and never abort a
//! recording. The variants here cover session misuse, configuration and
//! storage failures.

use thiserror::Error;

/// Unified error type for run-tracker operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecorderError {
    /// `start` was called while a session is already recording
    #[error("Recording session already started")]
    AlreadyStarted,
    /// `stop` was called without a running session
    #[error("No recording session in progress")]
    NotRecording,
    /// Configuration values are out of range
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },
    /// User-entered data failed validation
    #[error("Validation error: {message}")]
    Validation { message: String },
    /// Lookup by identifier found nothing
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },
    /// Persistence/storage error
    #[error("Persistence error: {message}")]
    Persistence { message: String },
    /// Encoding or decoding of stored/exported data failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl RecorderError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        RecorderError::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RecorderError::Validation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RecorderError {
    fn from(err: serde_json::Error) -> Self {
        RecorderError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for RecorderError {
    fn from(err: csv::Error) -> Self {
        RecorderError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<gpx::errors::GpxError> for RecorderError {
    fn from(err: gpx::errors::GpxError) -> Self {
        RecorderError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "persistence")]
impl From<rusqlite::Error> for RecorderError {
    fn from(err: rusqlite::Error) -> Self {
        RecorderError::Persistence {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "persistence")]
impl From<rmp_serde::encode::Error> for RecorderError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        RecorderError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "persistence")]
impl From<rmp_serde::decode::Error> for RecorderError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        RecorderError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for run-tracker operations.
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Extension trait for converting Option to RecorderError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a not-found error.
    fn ok_or_not_found(self, entity: &str, id: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str, id: &str) -> Result<T> {
        self.ok_or_else(|| RecorderError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecorderError::NotFound {
            entity: "Run".to_string(),
            id: "run-1".to_string(),
        };
        assert_eq!(err.to_string(), "Run 'run-1' not found");

        let err = RecorderError::config("split distance must be positive");
        assert!(err.to_string().contains("split distance"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_not_found("Workout", "2025-09-13");
        assert!(matches!(result, Err(RecorderError::NotFound { .. })));

        assert_eq!(Some(3).ok_or_not_found("Workout", "x"), Ok(3));
    }

    #[test]
    fn test_json_error_converts() {
        let err: RecorderError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, RecorderError::Serialization { .. }));
    }
}
