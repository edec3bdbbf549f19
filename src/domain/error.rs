//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for crossover.
#[derive(Debug, thiserror::Error)]
pub enum CrossoverError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid field {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("duplicate bar for {instrument} at {timestamp}")]
    Duplicate {
        instrument: String,
        timestamp: NaiveDateTime,
    },

    #[error("failed to fetch {location}: {reason}")]
    Fetch { location: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CrossoverError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&CrossoverError> for std::process::ExitCode {
    fn from(err: &CrossoverError) -> Self {
        let code: u8 = match err {
            CrossoverError::Io(_) | CrossoverError::Fetch { .. } => 1,
            CrossoverError::ConfigParse { .. }
            | CrossoverError::ConfigMissing { .. }
            | CrossoverError::ConfigInvalid { .. } => 2,
            CrossoverError::Database { .. } | CrossoverError::DatabaseQuery { .. } => 3,
            CrossoverError::InvalidParameter { .. }
            | CrossoverError::Validation { .. }
            | CrossoverError::Duplicate { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
