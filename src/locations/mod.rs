//! # Named Storage Locations
//!
//! A `Locations` registry owns the map from a location name to its
//! configuration and lazily constructs one backend instance per name,
//! cached for the registry's lifetime. The registry is an explicit value
//! handed around by reference; there is no process-wide state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::backend::{
    Backend, BackendError, BackendResult, FtpBackend, FtpConfig, LocalBackend, LocalConfig,
};

/// Configuration of one named location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "adapter", rename_all = "lowercase")]
pub enum LocationConfig {
    Local(LocalConfig),
    Ftp(FtpConfig),
}

impl LocationConfig {
    /// Construct the backend this configuration describes.
    ///
    /// Local backends bind immediately; FTP backends open and authenticate
    /// their connection here.
    fn build(&self) -> BackendResult<Arc<dyn Backend>> {
        match self {
            LocationConfig::Local(config) => Ok(Arc::new(LocalBackend::new(config.clone()))),
            LocationConfig::Ftp(config) => Ok(Arc::new(FtpBackend::connect(config.clone())?)),
        }
    }
}

/// Registry of named locations and their backend instances
#[derive(Default)]
pub struct Locations {
    configs: RwLock<HashMap<String, LocationConfig>>,
    instances: RwLock<HashMap<String, Arc<dyn Backend>>>,
}

impl std::fmt::Debug for Locations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .configs
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("Locations").field("names", &names).finish()
    }
}

impl Locations {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) a named location configuration.
    ///
    /// Replacing a configuration drops any cached backend instance so the
    /// next `get` constructs a fresh one.
    pub fn add(&self, name: impl Into<String>, config: LocationConfig) -> BackendResult<()> {
        let name = name.into();
        let mut configs = self
            .configs
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        let mut instances = self
            .instances
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        instances.remove(&name);
        configs.insert(name, config);
        Ok(())
    }

    /// Fetch the backend for a named location, constructing and caching it
    /// on first use.
    pub fn get(&self, name: &str) -> BackendResult<Arc<dyn Backend>> {
        {
            let instances = self
                .instances
                .read()
                .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
            if let Some(backend) = instances.get(name) {
                return Ok(Arc::clone(backend));
            }
        }

        let config = {
            let configs = self
                .configs
                .read()
                .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
            configs
                .get(name)
                .cloned()
                .ok_or_else(|| BackendError::LocationNotFound(name.to_string()))?
        };

        let backend = config.build()?;
        let mut instances = self
            .instances
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        let backend = instances
            .entry(name.to_string())
            .or_insert(backend)
            .clone();
        Ok(backend)
    }

    /// Drop a named location and any cached instance
    pub fn remove(&self, name: &str) -> BackendResult<()> {
        let mut configs = self
            .configs
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        let mut instances = self
            .instances
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        instances.remove(name);
        configs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::LocationNotFound(name.to_string()))
    }

    /// Registered location names
    pub fn names(&self) -> Vec<String> {
        self.configs
            .read()
            .map(|c| {
                let mut names: Vec<String> = c.keys().cloned().collect();
                names.sort();
                names
            })
            .unwrap_or_default()
    }
}

/// Parse a JSON map of named location configurations
pub fn parse_location_map(json: &str) -> BackendResult<Locations> {
    let configs: HashMap<String, LocationConfig> =
        serde_json::from_str(json).map_err(|e| BackendError::Internal(e.to_string()))?;
    let locations = Locations::new();
    for (name, config) in configs {
        locations.add(name, config)?;
    }
    Ok(locations)
}
