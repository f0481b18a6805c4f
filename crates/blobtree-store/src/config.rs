use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for [`FsBlobStore`](crate::FsBlobStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsStoreConfig {
    /// Directory holding the fan-out tree of blob files.
    pub root: PathBuf,
    /// Re-hash every blob on read and fail on mismatch.
    pub verify_on_read: bool,
    /// `fsync` each new blob file before it is renamed into place.
    pub sync_writes: bool,
}

impl Default for FsStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("blobs"),
            verify_on_read: true,
            sync_writes: false,
        }
    }
}

impl FsStoreConfig {
    /// Configuration rooted at `root` with default options.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }
}
