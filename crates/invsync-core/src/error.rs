//! Error types for invsync-core

use thiserror::Error;

/// Result type alias using invsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in invsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found in the target store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Connection or configuration problem with a store
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sync pass is already running for this tenant
    #[error("A sync pass is already in progress")]
    SyncInProgress,
}
