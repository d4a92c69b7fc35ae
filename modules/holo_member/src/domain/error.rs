use thiserror::Error;

use crate::domain::merge::MergeError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Generation type cannot be empty")]
    EmptyGenerationType,

    #[error("Invalid update params: {reason}")]
    InvalidUpdate { reason: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn empty_generation_type() -> Self {
        Self::EmptyGenerationType
    }

    pub fn invalid_update(reason: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            reason: reason.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<MergeError> for DomainError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::EmptyGenerationType => Self::EmptyGenerationType,
            MergeError::NullField(_) => Self::invalid_update(e.to_string()),
            MergeError::Invalid { field, message } => Self::validation(field, message),
        }
    }
}
