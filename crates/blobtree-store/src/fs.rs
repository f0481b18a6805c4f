use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use blobtree_types::ObjectId;
use tracing::{debug, trace};

use crate::config::FsStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::traits::BlobStore;

/// Filesystem blob store.
///
/// Each blob lives in its own file at `<root>/<hex[..2]>/<hex[2..]>`, the
/// same fan-out layout git uses for loose objects. New blobs are written to
/// a temporary file inside `root` and renamed into place.
#[derive(Debug)]
pub struct FsBlobStore {
    config: FsStoreConfig,
    hasher: ContentHasher,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_config(FsStoreConfig::at(root))
    }

    /// Open a store from an explicit configuration.
    pub fn with_config(config: FsStoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.root)?;
        Ok(Self {
            config,
            hasher: ContentHasher::BLOB,
        })
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Path of the file holding `id`.
    pub fn blob_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.config.root.join(&hex[..2]).join(&hex[2..])
    }

    /// Number of blobs on disk.
    pub fn len(&self) -> StoreResult<usize> {
        let mut count = 0;
        for shard in std::fs::read_dir(&self.config.root)? {
            let shard = shard?;
            if shard.file_type()?.is_dir() {
                for entry in std::fs::read_dir(shard.path())? {
                    if entry?.file_type()?.is_file() {
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = self.hasher.hash(data);
        let path = self.blob_path(&id);
        if path.exists() {
            trace!(id = %id.short_hex(), "blob already present");
            return Ok(id);
        }

        if let Some(shard) = path.parent() {
            std::fs::create_dir_all(shard)?;
        }
        let mut tmp = tempfile::NamedTempFile::new_in(&self.config.root)?;
        tmp.write_all(data)?;
        if self.config.sync_writes {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), len = data.len(), path = %path.display(), "stored blob");
        Ok(id)
    }

    fn fetch(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let data = match std::fs::read(self.blob_path(id)) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if self.config.verify_on_read {
            let computed = self.hasher.hash(&data);
            if computed != *id {
                return Err(StoreError::HashMismatch { id: *id, computed });
            }
        }
        Ok(Some(data))
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.blob_path(id).is_file())
    }
}
