//! # Upload Transfer Descriptors
//!
//! An upload arrives as an already-received file staged somewhere on local
//! disk, plus the state the receiving layer observed. Backends consume the
//! staged file (the local backend renames it into place, the FTP backend
//! STORs and deletes it), so a descriptor is good for exactly one upload.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of the transfer that produced the staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Fully received; the staged file is usable
    Complete,
    /// Only part of the file arrived
    Partial,
    /// The sender aborted the transfer
    Aborted,
    /// No file was sent at all
    Missing,
}

/// A received file waiting to be placed into a storage location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    /// Target file name (leaf only, no separators)
    pub name: String,
    /// Where the received bytes were staged
    pub tmp_path: PathBuf,
    /// Declared size in bytes
    pub size: u64,
    /// State of the transfer that produced the staging file
    pub status: TransferStatus,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, tmp_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            tmp_path: tmp_path.into(),
            size,
            status: TransferStatus::Complete,
        }
    }

    /// Check every rule, collecting all violations
    pub fn validate(&self, rules: &[UploadRule]) -> Vec<String> {
        let mut violations = Vec::new();
        for rule in rules {
            if let Some(v) = rule.check(self) {
                violations.push(v);
            }
        }
        violations
    }
}

/// Declarative validation rules applied before an upload is dispatched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadRule {
    /// File name must be non-empty
    NotEmpty,
    /// Declared size must not exceed the limit (bytes)
    MaxSize(u64),
    /// Declared size must be at least the limit (bytes)
    MinSize(u64),
    /// File extension must be one of the listed ones (no leading dot)
    Extension(Vec<String>),
}

impl UploadRule {
    fn check(&self, file: &FileUpload) -> Option<String> {
        match self {
            UploadRule::NotEmpty => {
                if file.name.trim().is_empty() {
                    Some("file name must not be empty".to_string())
                } else {
                    None
                }
            }
            UploadRule::MaxSize(limit) => {
                if file.size > *limit {
                    Some(format!("file exceeds {} bytes", limit))
                } else {
                    None
                }
            }
            UploadRule::MinSize(limit) => {
                if file.size < *limit {
                    Some(format!("file is smaller than {} bytes", limit))
                } else {
                    None
                }
            }
            UploadRule::Extension(allowed) => {
                let ext = file.name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
                match ext {
                    Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => None,
                    _ => Some(format!("file extension must be one of: {}", allowed.join(", "))),
                }
            }
        }
    }
}
