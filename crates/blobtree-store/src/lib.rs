//! Content-addressed blob storage for blobtree.
//!
//! The codec in the `blobtree` crate treats storage as an external
//! collaborator reached through the [`BlobStore`] trait: `put` stores bytes
//! and returns their [`ObjectId`], `fetch` returns exactly the bytes that were
//! stored under an ID. This crate defines that trait, the hashing scheme used
//! to name blobs, and two backends.
//!
//! # Storage Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per blob under a fan-out directory tree
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. Writes are idempotent: storing identical bytes twice yields the same ID
//!    and performs no second write.
//! 3. Concurrent reads and writes are safe; duplicate concurrent writes race
//!    harmlessly.
//! 4. The store never interprets blob contents.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! [`ObjectId`]: blobtree_types::ObjectId

pub mod config;
pub mod error;
pub mod fs;
pub mod hasher;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::FsStoreConfig;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use hasher::ContentHasher;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
