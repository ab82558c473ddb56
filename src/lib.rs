//! fsbridge - a uniform storage adapter layer over local and FTP filesystems
//!
//! One contract (`backend::Backend`) over two hierarchical stores, a
//! registry of named locations, and a thin facade dispatching by name.

pub mod backend;
pub mod cli;
pub mod facade;
pub mod locations;

pub use backend::{
    Backend, BackendError, BackendResult, Entity, EntityData, FileUpload, FtpBackend, FtpConfig,
    LocalBackend, LocalConfig, MkdirOptions, RemoveOptions, SizeUnit, TransferStatus,
    UploadOptions, UploadRule,
};
pub use facade::Filesystem;
pub use locations::{LocationConfig, Locations};
