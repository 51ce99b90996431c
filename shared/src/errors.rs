//! Shared error types for the tracker workspace

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: Uuid },

    #[error("Storage operation failed: {operation} - {message}")]
    StorageError { operation: String, message: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SharedError {
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SharedError::StorageError {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(e: serde_json::Error) -> Self {
        SharedError::SerializationError { message: e.to_string() }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
