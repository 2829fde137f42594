//! Start-up configuration for the global bridge.
//!
//! ```json
//! { "last_reserved_fd": 100, "backend": { "kind": "directory", "root": "/tmp/fs" } }
//! ```
//!
//! Every field is optional; missing ones take the defaults below.
use crate::storage::{DirStorage, MemoryStorage, Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysdefs::constants::LAST_RESERVED_FD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("last_reserved_fd {0} leaves no descriptor a C int can hold")]
    ReservedRange(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeIoConfig {
    /// Descriptors handed out start right after this one.
    pub last_reserved_fd: u64,
    pub backend: BackendConfig,
}

/// Which storage the bridge forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Memory,
    Directory { root: PathBuf },
}

impl Default for NativeIoConfig {
    fn default() -> Self {
        NativeIoConfig {
            last_reserved_fd: LAST_RESERVED_FD,
            backend: BackendConfig::Memory,
        }
    }
}

impl NativeIoConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Descriptors are returned to C as `int`, so at least one must fit
    /// above the reserved range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.last_reserved_fd >= i32::MAX as u64 {
            return Err(ConfigError::ReservedRange(self.last_reserved_fd));
        }
        Ok(())
    }

    /// Builds the configured backend.  A directory backend creates its root.
    pub fn build_storage(&self) -> Result<Arc<dyn Storage>, StorageError> {
        Ok(match &self.backend {
            BackendConfig::Memory => Arc::new(MemoryStorage::new()),
            BackendConfig::Directory { root } => Arc::new(DirStorage::new(root.clone())?),
        })
    }
}
