//! Core error types for blinkbreak-core.
//!
//! State transitions in the scheduler, skip limiter and break session are
//! total and never fail. Errors only come from the preference store (disk
//! and value validation) and from resolving the data directory.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for blinkbreak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preference-related errors
    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),
}

/// Preference-store errors.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// The key is not one of the declared preference keys
    #[error("unknown preference key: {0}")]
    UnknownKey(String),

    /// Value is outside the key's domain or has the wrong type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to save preferences
    #[error("Failed to save preferences to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Home/data directory could not be prepared
    #[error("Failed to prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },
}

impl PreferenceError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        PreferenceError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_error_wraps_into_core_error() {
        let err: CoreError = PreferenceError::UnknownKey("volume".into()).into();
        assert_eq!(
            err.to_string(),
            "Preference error: unknown preference key: volume"
        );
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = PreferenceError::invalid("interval", "must be at least 1 second");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'interval': must be at least 1 second"
        );
    }
}
