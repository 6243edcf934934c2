use thiserror::Error;

use crate::document::DocumentError;

/// Errors that can occur during document store operations.
///
/// Conflicts and already-deleted documents are not errors: they are reported
/// through [`Outcome`](super::Outcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document is missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("No _rev for document {id}, deletes must be revision-qualified")]
    MissingRevision { id: String },
    #[error("Table '{table_name}' not found")]
    TableNotFound { table_name: String },
    #[error("Timed out waiting for table '{table_name}' ({state})")]
    ProvisionTimeout { table_name: String, state: String },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Backend operation failed: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DocumentError> for StoreError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::MissingField(field) => StoreError::MissingField(field),
            DocumentError::InvalidField { field, reason } => {
                StoreError::InvalidField { field, reason }
            }
            DocumentError::NotAnObject => StoreError::InvalidData(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
