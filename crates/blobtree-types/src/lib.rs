//! Foundation types for blobtree.
//!
//! This crate provides the identifier shared by every other blobtree crate:
//! the content-addressed [`ObjectId`] that names one immutable blob.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`TypeError`] -- Parse failures for the textual form of an [`ObjectId`]

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
