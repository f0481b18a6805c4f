use blobtree_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - `put` is deterministic and idempotent: the same bytes always produce
///   the same ID, and storing them again performs no duplicate write.
/// - `fetch` returns exactly the bytes previously stored under the ID.
/// - Concurrent use from several threads is safe (`Send + Sync`).
/// - The store never interprets blob contents.
/// - All I/O errors are propagated, never silently ignored.
///
/// Timeouts, retries and backoff are the backend's concern; callers surface
/// whatever error the backend reports.
pub trait BlobStore: Send + Sync {
    /// Store `data` and return its content-addressed ID.
    ///
    /// If the blob already exists, this is a no-op.
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId>;

    /// Read a blob by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the blob does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn fetch(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a blob exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.fetch(id)?.is_some())
    }

    /// Read a blob that is required to exist.
    ///
    /// Maps a missing blob to [`StoreError::NotFound`].
    fn fetch_required(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.fetch(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read multiple blobs in a batch.
    ///
    /// Default implementation calls `fetch()` for each ID. Backends may
    /// override for better performance (e.g., fewer I/O round-trips).
    fn fetch_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        ids.iter().map(|id| self.fetch(id)).collect()
    }

    /// Store multiple blobs in a batch and return their IDs.
    ///
    /// Default implementation calls `put()` for each blob.
    fn put_batch(&self, blobs: &[&[u8]]) -> StoreResult<Vec<ObjectId>> {
        blobs.iter().map(|data| self.put(data)).collect()
    }
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        (**self).put(data)
    }

    fn fetch(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        (**self).fetch(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        (**self).exists(id)
    }
}

impl<S: BlobStore + ?Sized> BlobStore for std::sync::Arc<S> {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        (**self).put(data)
    }

    fn fetch(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        (**self).fetch(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        (**self).exists(id)
    }
}
