//! Backend error taxonomy

use crate::state::forms::ErrorMap;
use thiserror::Error;

/// Failure reported by a backend collaborator.
///
/// Display strings are the user-facing messages shown in banners.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Please log in to continue")]
    Unauthorized,

    /// The operation is not allowed on this record or form
    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    /// Per-field rejection, e.g. a uniqueness conflict
    #[error("Validation failed")]
    Validation(ErrorMap),

    #[error("An unexpected error occurred")]
    Io(#[from] std::io::Error),

    #[error("An unexpected error occurred")]
    Serde(#[from] serde_json::Error),
}

impl BackendError {
    /// Validation error for a single field
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = ErrorMap::new();
        errors.insert(name.to_string(), message.to_string());
        BackendError::Validation(errors)
    }

    /// Underlying detail for logs, beyond the user-facing message
    pub fn detail(&self) -> String {
        match self {
            BackendError::Io(err) => err.to_string(),
            BackendError::Serde(err) => err.to_string(),
            BackendError::Validation(errors) => format!("{errors:?}"),
            other => other.to_string(),
        }
    }
}
