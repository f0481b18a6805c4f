//! Encode typed values as Merkle trees of content-addressed blobs, and back.
//!
//! Every value becomes one or more immutable blobs in a [`BlobStore`], each
//! named by the [`ObjectId`] of its bytes. Scalars are stored as plain text,
//! sequences and mappings as JSON lists (or objects) of child references,
//! and records as JSON objects keyed by field name. Identical sub-values
//! share one blob, so deduplication falls out of content addressing.
//!
//! # Blob Formats
//!
//! - `bool` -- the empty blob for `false`, `true` for `true`
//! - integers and floats -- base-10 text, never in exponent form
//! - `String` -- the raw UTF-8 bytes
//! - `Vec<T>`, `[T; N]` -- `["<ref>", ...]`; the empty sequence is the empty blob
//! - `HashMap<K, V>`, `BTreeMap<K, V>` -- `{"<key>": "<ref>", ...}`
//! - `#[derive(Record)]` structs -- `{"<field>": <literal | ref | refs>, ...}`
//! - `Option<T>`, `Box<T>` -- the blob of the pointee
//!
//! Field directives control how a record field is stored; see [`policy`].
//! Types that need their own representation implement [`Marshal`] and
//! [`Unmarshal`] and register with [`impl_custom_value!`].
//!
//! # Example
//!
//! ```rust, ignore
//! use blobtree::{marshal, unmarshal, InMemoryBlobStore, Record};
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! struct Note {
//!     title: String,
//!     #[blobtree(",omitempty")]
//!     tags: Vec<String>,
//! }
//!
//! let store = InMemoryBlobStore::new();
//! let note = Note { title: "hello".into(), tags: vec!["a".into()] };
//! let id = marshal(&store, &note)?;
//! let mut back = Note::default();
//! unmarshal(&store, &id, &mut back)?;
//! assert_eq!(back, note);
//! ```

// Lets `#[derive(Record)]` output, which names `::blobtree`, compile here.
extern crate self as blobtree;

pub mod config;
pub mod context;
pub mod decode;
pub mod encode;
pub mod error;
pub mod hook;
mod impls;
mod json;
mod literal;
pub mod policy;
pub mod record;
pub mod value;

pub use config::CodecConfig;
pub use context::{Cancellation, Context};
pub use decode::Decoder;
pub use encode::Encoder;
pub use error::{CodecError, CodecResult, ResultExt};
pub use hook::{Marshal, Unmarshal};
pub use policy::FieldSpec;
pub use record::{FieldDecl, FieldLayout, Record, RecordLayout, WireSlot, WireValue};
pub use value::{
    Fill, FloatWidth, Kind, MapKey, MappingSlot, Number, ReferenceSlot, SequenceSlot, Slot, Value,
    View, Width,
};

pub use blobtree_derive::Record;

// Re-export key types
pub use blobtree_store::{BlobStore, FsBlobStore, FsStoreConfig, InMemoryBlobStore, StoreError};
pub use blobtree_types::ObjectId;

/// Store `value` in `store` with default options and return its root ID.
pub fn marshal(store: &dyn BlobStore, value: &dyn Value) -> CodecResult<ObjectId> {
    Encoder::new(store).encode(&Context::background(), value)
}

/// Populate `dest` from the tree rooted at `id` in `store`.
pub fn unmarshal(store: &dyn BlobStore, id: &ObjectId, dest: &mut dyn Value) -> CodecResult<()> {
    Decoder::new(store).decode(&Context::background(), id, dest)
}
