//! # Filesystem Entities
//!
//! An `Entity` describes one file or directory returned by a listing and
//! keeps a non-owning reference to the backend that produced it, so a
//! listing can be walked and acted on without the caller reconstructing
//! paths. Entities are built fresh on every `ls` and never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{BackendError, BackendResult};
use super::{Backend, MkdirOptions, RemoveOptions};

/// Units `EntityData::size_in` can convert to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
}

impl SizeUnit {
    fn bytes(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::Kb => 1024,
            SizeUnit::Mb => 1024 * 1024,
            SizeUnit::Gb => 1024 * 1024 * 1024,
            SizeUnit::Tb => 1024u64.pow(4),
        }
    }
}

/// The plain record behind an entity
///
/// `path` is the parent directory relative to the backend's configured
/// root, always `/`-terminated (`/` at the root); the full logical path is
/// `path + name`. `size` is `None` for directories — absent, not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityData {
    pub name: String,
    pub dir: bool,
    pub url: Option<String>,
    pub path: String,
    pub size: Option<u64>,
    pub mode: Option<String>,
    pub modified: Option<DateTime<Utc>>,
}

impl EntityData {
    /// Full logical path from the location's root
    pub fn full_path(&self) -> String {
        format!("{}{}", self.path, self.name)
    }

    /// File size converted to `unit`; `None` for directories
    pub fn size_in(&self, unit: SizeUnit) -> Option<f64> {
        self.size.map(|s| s as f64 / unit.bytes() as f64)
    }
}

/// One file or directory, bound to the backend that listed it
pub struct Entity<'a> {
    data: EntityData,
    source: &'a dyn Backend,
}

impl fmt::Debug for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("data", &self.data).finish()
    }
}

impl<'a> Entity<'a> {
    pub fn new(data: EntityData, source: &'a dyn Backend) -> Self {
        Self { data, source }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn is_dir(&self) -> bool {
        self.data.dir
    }

    pub fn url(&self) -> Option<&str> {
        self.data.url.as_deref()
    }

    /// Parent directory path, `/`-terminated, relative to the root
    pub fn path(&self) -> &str {
        &self.data.path
    }

    pub fn size(&self) -> Option<u64> {
        self.data.size
    }

    pub fn mode(&self) -> Option<&str> {
        self.data.mode.as_deref()
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.data.modified
    }

    /// Full logical path from the location's root
    pub fn full_path(&self) -> String {
        self.data.full_path()
    }

    /// The plain serializable record
    pub fn data(&self) -> &EntityData {
        &self.data
    }

    pub fn into_data(self) -> EntityData {
        self.data
    }

    /// List this entity's children; fails unless it is a directory
    pub fn ls(&self) -> BackendResult<Vec<Entity<'a>>> {
        if !self.data.dir {
            return Err(BackendError::NotADirectory(self.full_path()));
        }
        self.source.ls(&self.full_path())
    }

    /// Create `name` under this entity; fails unless it is a directory
    pub fn mkdir(&self, name: &str, options: MkdirOptions) -> BackendResult<()> {
        if !self.data.dir {
            return Err(BackendError::NotADirectory(self.full_path()));
        }
        self.source
            .mkdir(&format!("{}/{}", self.full_path(), name), options)
    }

    /// Copy this entity to `destination`
    pub fn copy(&self, destination: &str) -> BackendResult<()> {
        self.source.copy(&self.full_path(), destination)
    }

    /// Move this entity to `destination`
    pub fn mv(&self, destination: &str) -> BackendResult<()> {
        self.source.mv(&self.full_path(), destination)
    }

    /// Remove this entity
    pub fn remove(&self, options: RemoveOptions) -> BackendResult<()> {
        self.source.remove(&self.full_path(), options)
    }
}
