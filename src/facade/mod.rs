//! # Filesystem Facade
//!
//! Thin dispatch layer: every call names a location, the facade fetches
//! that location's backend from the registry and forwards. Listings come
//! back as owned `EntityData` records; callers who want chainable entities
//! fetch the backend from the registry themselves and hold on to it.

use crate::backend::{
    BackendError, BackendResult, EntityData, FileUpload, MkdirOptions, RemoveOptions,
    UploadOptions, UploadRule,
};
use crate::locations::Locations;

/// Per-location dispatch over a registry of named locations
#[derive(Debug)]
pub struct Filesystem<'a> {
    locations: &'a Locations,
}

impl<'a> Filesystem<'a> {
    pub fn new(locations: &'a Locations) -> Self {
        Self { locations }
    }

    /// List a directory on a named location
    pub fn ls(&self, location: &str, path: &str) -> BackendResult<Vec<EntityData>> {
        let backend = self.locations.get(location)?;
        let entities = backend.ls(path)?;
        Ok(entities.into_iter().map(|e| e.into_data()).collect())
    }

    /// Create a directory on a named location
    pub fn mkdir(&self, location: &str, name: &str, options: MkdirOptions) -> BackendResult<()> {
        self.locations.get(location)?.mkdir(name, options)
    }

    /// Validate and place a received file on a named location.
    ///
    /// Rules are checked before any backend work; all violations are
    /// reported together.
    pub fn upload(
        &self,
        location: &str,
        file: &FileUpload,
        destination: &str,
        options: UploadOptions,
        rules: &[UploadRule],
    ) -> BackendResult<()> {
        let violations = file.validate(rules);
        if !violations.is_empty() {
            return Err(BackendError::UploadRejected(violations));
        }
        self.locations
            .get(location)?
            .upload(file, destination, options)
    }

    /// Copy a file or directory tree on a named location
    pub fn copy(&self, location: &str, source: &str, destination: &str) -> BackendResult<()> {
        self.locations.get(location)?.copy(source, destination)
    }

    /// Move a file or directory on a named location
    pub fn mv(&self, location: &str, source: &str, destination: &str) -> BackendResult<()> {
        self.locations.get(location)?.mv(source, destination)
    }

    /// Remove a file or directory on a named location
    pub fn remove(&self, location: &str, path: &str, options: RemoveOptions) -> BackendResult<()> {
        self.locations.get(location)?.remove(path, options)
    }
}
