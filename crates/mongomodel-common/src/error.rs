//! Error types for mongomodel

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mongomodel operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// MongoDB server error code for "collection already exists"
pub const NAMESPACE_EXISTS_CODE: i32 = 48;

/// MongoDB server error code for "ns not found"
pub const NAMESPACE_NOT_FOUND_CODE: i32 = 26;

/// MongoDB server error code for unique index violations
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Unified error type for all mongomodel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Local input check failed before any driver call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Collection already exists (server code 48)
    #[error("Namespace exists: {0}")]
    NamespaceExists(String),

    /// Target collection does not exist (server code 26)
    #[error("Nothing happened: namespace {0} not found")]
    NamespaceNotFound(String),

    /// Duplicate key (server code 11000)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generator refused to overwrite an existing file
    #[error("File exists: {0}")]
    FileExists(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModelError {
    /// Shorthand for a validation failure with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    /// Returns true if this error was raised by the local validator
    pub fn is_validation(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }

    /// Returns true if the target collection already exists
    pub fn is_namespace_exists(&self) -> bool {
        matches!(self, ModelError::NamespaceExists(_))
    }

    pub fn is_namespace_not_found(&self) -> bool {
        matches!(self, ModelError::NamespaceNotFound(_))
    }

    /// Returns true if this is a uniqueness violation of any kind
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ModelError::NamespaceExists(_) | ModelError::Conflict(_) | ModelError::FileExists(_)
        )
    }

    /// Payload carried by `<operation>-error` events
    pub fn signal(&self) -> ErrorSignal {
        match self {
            // validation messages travel bare, e.g. "input query must be an object"
            ModelError::Validation(message) => ErrorSignal::new(message.clone()),
            other => ErrorSignal::new(other.to_string()),
        }
    }
}

/// `{ "error": "<message>" }` payload of a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSignal {
    pub error: String,
}

impl ErrorSignal {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl std::fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)
    }
}

impl From<&ModelError> for ErrorSignal {
    fn from(err: &ModelError) -> Self {
        err.signal()
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for ModelError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match err.kind.as_ref() {
            ErrorKind::Command(cmd) if cmd.code == NAMESPACE_EXISTS_CODE => {
                ModelError::NamespaceExists(format!("{} ({})", cmd.message, cmd.code_name))
            }
            ErrorKind::Command(cmd) if cmd.code == NAMESPACE_NOT_FOUND_CODE => {
                ModelError::NamespaceNotFound(cmd.message.clone())
            }
            ErrorKind::Command(cmd) if cmd.code == DUPLICATE_KEY_CODE => {
                ModelError::Conflict(cmd.message.clone())
            }
            ErrorKind::Write(WriteFailure::WriteError(write_err))
                if write_err.code == DUPLICATE_KEY_CODE =>
            {
                ModelError::Conflict(write_err.message.clone())
            }
            ErrorKind::InsertMany(insert_err)
                if insert_err
                    .write_errors
                    .as_ref()
                    .is_some_and(|errs| errs.iter().any(|e| e.code == DUPLICATE_KEY_CODE)) =>
            {
                ModelError::Conflict(err.to_string())
            }
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. } => ModelError::Connection(err.to_string()),
            _ => ModelError::MongoDB(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for ModelError {
    fn from(err: bson::ser::Error) -> Self {
        ModelError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for ModelError {
    fn from(err: bson::de::Error) -> Self {
        ModelError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}
