//! Bootstrap configuration: the builtin backend and the initial mounts.
//!
//! Configurations are JSON documents like:
//! ```json
//! {
//!   "builtin": {"type": "memory", "id": "builtin", "data": {"users": {}}},
//!   "mounts": [
//!     {"path": "/roles", "backend": {"type": "json_file", "id": "roles", "path": "roles.json"}}
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use fedstore_core::{Backend, Error, Path, Value};
use fedstore_json_store::InMemoryStore;
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

/// How to construct one backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory store, optionally seeded with `data` (an empty map otherwise).
    Memory {
        id: String,
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        read_only: bool,
    },
    /// In-memory store seeded from a JSON file read once at startup.
    JsonFile {
        id: String,
        path: PathBuf,
        #[serde(default)]
        read_only: bool,
    },
}

impl BackendConfig {
    pub fn id(&self) -> &str {
        match self {
            BackendConfig::Memory { id, .. } | BackendConfig::JsonFile { id, .. } => id,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory {
            id: "builtin".to_string(),
            data: None,
            read_only: false,
        }
    }
}

/// A backend to attach at `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MountConfig {
    pub path: String,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub builtin: BackendConfig,
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

impl StorageConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<FsPath>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::configuration(format!("cannot open {}: {}", path.display(), err))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Creates backends from their configuration.
pub trait BackendFactory: Send + Sync {
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn Backend>, Error>;
}

/// Builds every backend as an [`InMemoryStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackendFactory;

impl BackendFactory for MemoryBackendFactory {
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn Backend>, Error> {
        let (store, read_only) = match config {
            BackendConfig::Memory {
                id,
                data,
                read_only,
            } => (
                InMemoryStore::with_data(id.as_str(), data.clone().unwrap_or_else(Value::map)),
                *read_only,
            ),
            BackendConfig::JsonFile {
                id,
                path,
                read_only,
            } => {
                let file = File::open(path).map_err(|err| {
                    Error::configuration(format!("cannot open {}: {}", path.display(), err))
                })?;
                (
                    InMemoryStore::from_reader(id.as_str(), BufReader::new(file))?,
                    *read_only,
                )
            }
        };
        let store = if read_only { store.read_only() } else { store };
        Ok(Arc::new(store))
    }
}

impl Storage {
    /// Build a coordinator from `config`, mounting backends in listed order.
    pub fn from_config(
        config: &StorageConfig,
        factory: &dyn BackendFactory,
    ) -> Result<Self, Error> {
        let storage = Storage::new(factory.create(&config.builtin)?);
        for mount in &config.mounts {
            let path = Path::parse(&mount.path)?;
            storage.mount(factory.create(&mount.backend)?, path)?;
        }
        Ok(storage)
    }
}
