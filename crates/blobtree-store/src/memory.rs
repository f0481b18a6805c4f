use std::collections::HashMap;
use std::sync::RwLock;

use blobtree_types::ObjectId;
use tracing::{debug, trace};

use crate::error::StoreResult;
use crate::hasher::ContentHasher;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All blobs are held in memory behind a
/// `RwLock` for safe concurrent access. Blobs are cloned on read.
pub struct InMemoryBlobStore {
    hasher: ContentHasher,
    blobs: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_hasher(ContentHasher::BLOB)
    }

    /// Create a new empty store naming blobs with `hasher`.
    pub fn with_hasher(hasher: ContentHasher) -> Self {
        Self {
            hasher,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Remove all blobs from the store.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all blob IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = self.hasher.hash(data);
        let mut map = self.blobs.write().expect("lock poisoned");
        if map.contains_key(&id) {
            trace!(id = %id.short_hex(), "blob already present");
        } else {
            debug!(id = %id.short_hex(), len = data.len(), "stored blob");
            map.insert(id, data.to_vec());
        }
        Ok(id)
    }

    fn fetch(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryBlobStore")
            .field("domain", &self.hasher.domain())
            .field("blob_count", &count)
            .finish()
    }
}
