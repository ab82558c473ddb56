//! # Backend Errors

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend operation errors
///
/// Every logical failure of the storage contract (not-found,
/// already-exists, not-a-directory, incomplete transfer) maps to exactly
/// one variant here; `Err(_)` is the contract's failure result and the
/// variant is the added detail channel.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    // Upload errors
    #[error("Transfer incomplete: {0}")]
    TransferIncomplete(String),

    #[error("Upload rejected: {}", .0.join("; "))]
    UploadRejected(Vec<String>),

    // Remote transport errors
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("FTP error: {0}")]
    Ftp(String),

    // Registry errors
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e.to_string())
    }
}

impl From<suppaftp::FtpError> for BackendError {
    fn from(e: suppaftp::FtpError) -> Self {
        BackendError::Ftp(e.to_string())
    }
}
