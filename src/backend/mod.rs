//! # Storage Backends
//!
//! One contract over two hierarchical stores: a local disk tree and a
//! remote FTP tree. Callers address everything relative to a configured
//! root; backends translate to native paths and implement the same
//! enumerate-recurse-fail-fast shape for tree-wide operations.

pub mod entity;
pub mod errors;
pub mod ftp;
pub mod local;
pub mod path;
pub mod upload;

pub use entity::{Entity, EntityData, SizeUnit};
pub use errors::{BackendError, BackendResult};
pub use ftp::{FtpBackend, FtpConfig};
pub use local::{LocalBackend, LocalConfig};
pub use upload::{FileUpload, TransferStatus, UploadRule};

/// Options for `mkdir`
#[derive(Debug, Clone, Copy)]
pub struct MkdirOptions {
    /// Permission bits applied to each created directory
    pub mode: u32,
    /// Create missing ancestor segments in order
    pub recursive: bool,
}

impl Default for MkdirOptions {
    fn default() -> Self {
        Self {
            mode: 0o777,
            recursive: true,
        }
    }
}

/// Options for `remove`
#[derive(Debug, Clone, Copy)]
pub struct RemoveOptions {
    /// Remove directory children first
    pub recursive: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Options for `upload`
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Replace an existing file of the same name
    pub overwrite: bool,
}

/// The storage contract every backend implements
///
/// All operations are synchronous and blocking; recursive tree operations
/// enumerate children, recurse through these same contract methods, and
/// abort at the first child failure without rolling back completed work.
pub trait Backend: Send + Sync {
    /// List a directory, root if `path` is empty.
    ///
    /// Fails (the sentinel, distinct from an empty listing) when `path`
    /// does not resolve to a directory.
    fn ls(&self, path: &str) -> BackendResult<Vec<Entity<'_>>>;

    /// Create a directory.
    ///
    /// Fails if the target already exists. Without `recursive` any missing
    /// ancestor is a failure; with it, ancestors are created in order and
    /// the first segment that cannot be created aborts the operation,
    /// leaving earlier segments in place.
    fn mkdir(&self, name: &str, options: MkdirOptions) -> BackendResult<()>;

    /// Place a received file into `destination`, consuming its staged copy.
    ///
    /// Fails if the transfer did not complete, if `destination` is not an
    /// existing directory, or if the target name exists and `overwrite`
    /// was not requested.
    fn upload(&self, file: &FileUpload, destination: &str, options: UploadOptions)
        -> BackendResult<()>;

    /// Copy a file, or a directory tree child by child.
    ///
    /// Fails if the source is missing or the destination exists; a
    /// directory copy aborts at the first failed child, keeping the
    /// children already copied.
    fn copy(&self, source: &str, destination: &str) -> BackendResult<()>;

    /// Move via a single backend-native rename.
    ///
    /// Fails if the source is missing or the destination exists.
    fn mv(&self, source: &str, destination: &str) -> BackendResult<()>;

    /// Remove a file or directory.
    ///
    /// Fails if the path is missing. A directory is emptied child by child
    /// first when `recursive`; otherwise the native removal of a non-empty
    /// directory fails and that failure is surfaced.
    fn remove(&self, path: &str, options: RemoveOptions) -> BackendResult<()>;
}
