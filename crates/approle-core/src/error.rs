//! Errors raised while building descriptors and applying changes.

use thiserror::Error;

use crate::apply::Operation;

/// Failure reported by a [`Directory`](crate::Directory) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("Directory request failed: {0}")]
    Transport(String),

    #[error("Directory authentication failed: {0}")]
    Auth(String),

    /// The directory answered with a non-success status.
    #[error("Directory API error (HTTP {status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid directory response: {0}")]
    Decode(String),

    #[error("Directory object not found: {0}")]
    NotFound(String),
}

impl DirectoryError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// A single create or delete that the directory rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {source}")]
pub struct ApplyError {
    pub operation: Operation,
    #[source]
    pub source: DirectoryError,
}

/// Errors that end a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No service principal has the configured client id as its app id.
    #[error("No service principal found for application {client_id}")]
    Lookup { client_id: String },

    /// A configured role value is not in the application's role catalog.
    #[error("{role}: No such role in {application}")]
    UnknownRole { role: String, application: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// One or more operations failed while applying changes. Carries the
    /// first failure in report order.
    #[error("{failed} of {attempted} assignment operations failed; first error: {first}")]
    Apply {
        failed: usize,
        attempted: usize,
        #[source]
        first: ApplyError,
    },
}

impl SyncError {
    pub fn lookup(client_id: impl Into<String>) -> Self {
        Self::Lookup {
            client_id: client_id.into(),
        }
    }

    pub fn unknown_role(role: impl Into<String>, application: impl Into<String>) -> Self {
        Self::UnknownRole {
            role: role.into(),
            application: application.into(),
        }
    }

    /// True for errors raised before any directory write was attempted.
    pub fn is_pre_write(&self) -> bool {
        !matches!(self, Self::Apply { .. })
    }
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;
