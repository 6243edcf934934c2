use thiserror::Error;

/// Errors raised while reading engine fields out of a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document is missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Document must be a JSON object")]
    NotAnObject,
}
