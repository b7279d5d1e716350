//! Error types shared by the coordinator and its backends.

use std::fmt;

use crate::path::{Path, PathError};
use crate::transaction::TransactionId;

/// A capability a backend may or may not declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Write,
    Trigger,
    Transactions,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Write => "writes",
            Capability::Trigger => "triggers",
            Capability::Transactions => "transactions",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Path(#[from] PathError),

    /// A mount could not be installed, or a configuration was rejected.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A JSON document (initial data or configuration) could not be decoded.
    #[error("could not decode document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("path not found: {path}")]
    NotFound { path: Path },

    /// The target backend does not declare what the operation needs.
    #[error("backend '{backend}' does not support {operation}")]
    Unsupported { backend: String, operation: String },

    #[error("transaction {txn}: {message}")]
    Transaction {
        txn: TransactionId,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Pattern evaluation failed while building an index.
    #[error("failed to build index for {pattern}: {source}")]
    Index {
        pattern: String,
        #[source]
        source: Box<Error>,
    },

    /// Any other failure reported by a backend.
    #[error("backend '{backend}': {message}")]
    Internal { backend: String, message: String },

    /// The call context was cancelled before the backend finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn not_found(path: &Path) -> Self {
        Error::NotFound { path: path.clone() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn unsupported(backend: impl Into<String>, capability: Capability) -> Self {
        Error::Unsupported {
            backend: backend.into(),
            operation: capability.to_string(),
        }
    }

    pub fn internal(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Internal {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
