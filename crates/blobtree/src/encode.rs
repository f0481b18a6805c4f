//! Value → blob tree.

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use blobtree_store::BlobStore;
use blobtree_types::ObjectId;

use crate::config::CodecConfig;
use crate::context::Context;
use crate::error::{CodecError, CodecResult, ResultExt};
use crate::json;
use crate::literal;
use crate::record::{Record, WireSlot};
use crate::value::{Kind, Value, View};

/// Writes values into a [`BlobStore`] as trees of content-addressed blobs.
///
/// An encoder holds no state beyond the store handle and its output
/// options, so one instance may be shared freely or built per call.
#[derive(Clone)]
pub struct Encoder<'s> {
    store: &'s dyn BlobStore,
    config: CodecConfig,
}

impl<'s> Encoder<'s> {
    pub fn new(store: &'s dyn BlobStore) -> Self {
        Self {
            store,
            config: CodecConfig::default(),
        }
    }

    /// Use `config` for the JSON text of container and record blobs.
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Store `value` and everything beneath it, returning the root ID.
    ///
    /// Values exposing a custom hook are handed to it unchanged. References
    /// are followed to the first non-reference value; a chain ending in a
    /// null reference fails with [`CodecError::UnsupportedType`].
    pub fn encode(&self, cx: &Context, value: &dyn Value) -> CodecResult<ObjectId> {
        cx.check()?;
        let target = resolve(value)?;
        let kind = target.kind();

        let blob = match target.view() {
            View::Custom(hook) => return hook.marshal(cx, self.store),
            View::Bool(true) => b"true".to_vec(),
            View::Bool(false) => Vec::new(),
            View::Int(n) => n.to_string().into_bytes(),
            View::Uint(n) => n.to_string().into_bytes(),
            View::Float32(f) => float_text(f64::from(f), || f.to_string()).into_bytes(),
            View::Float64(f) => float_text(f, || f.to_string()).into_bytes(),
            View::Text(s) => s.as_bytes().to_vec(),
            View::Sequence(items) if items.is_empty() => Vec::new(),
            View::Sequence(items) => {
                let ids = self.encode_elements(cx, items)?;
                json::write_document(&self.config, &json::refs_to_json(&ids))?
            }
            View::Mapping(entries) if entries.is_empty() => Vec::new(),
            View::Mapping(entries) => {
                let entries = self.encode_entries(cx, entries)?;
                json::write_document(&self.config, &json::ref_map_to_json(entries))?
            }
            View::Record(record) => self.record_blob(cx, record)?,
            View::Reference(_) => {
                return Err(CodecError::UnsupportedType {
                    type_name: target.type_name(),
                    reason: "reference reports a non-reference kind",
                })
            }
        };

        self.put(cx, kind, target.type_name(), &blob)
    }

    fn encode_elements(&self, cx: &Context, items: Vec<&dyn Value>) -> CodecResult<Vec<ObjectId>> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.encode(cx, item).context(|| format!("element {i}")))
            .collect()
    }

    fn encode_entries(
        &self,
        cx: &Context,
        entries: Vec<(String, &dyn Value)>,
    ) -> CodecResult<Vec<(String, ObjectId)>> {
        entries
            .into_iter()
            .map(|(key, item)| {
                let id = self.encode(cx, item).context(|| format!("key {key:?}"))?;
                Ok((key, id))
            })
            .collect()
    }

    fn record_blob(&self, cx: &Context, record: &dyn Record) -> CodecResult<Vec<u8>> {
        let layout = record.layout();
        let mut object = Map::new();

        for (index, field) in layout.fields().iter().enumerate() {
            if field.wire == WireSlot::Skip {
                continue;
            }
            let value = record
                .field(index)
                .ok_or_else(|| layout.inaccessible(index))?;
            if field.spec.omit_if_default && value.is_zero() {
                continue;
            }

            let entry = match field.wire {
                WireSlot::Skip => continue,
                WireSlot::Literal => literal::to_literal(value),
                WireSlot::RefList => match value.view() {
                    View::Sequence(items) => self
                        .encode_elements(cx, items)
                        .map(|ids| json::refs_to_json(&ids)),
                    _ => Err(kind_drift(value)),
                },
                WireSlot::RefMap => match value.view() {
                    View::Mapping(entries) => self
                        .encode_entries(cx, entries)
                        .map(json::ref_map_to_json),
                    _ => Err(kind_drift(value)),
                },
                WireSlot::Ref => self.encode(cx, value).map(|id| json::ref_to_json(&id)),
            };
            let entry = entry.context(|| {
                format!(
                    "storing field {} of record {}",
                    field.spec.stored_name,
                    layout.name()
                )
            })?;
            object.insert(field.spec.stored_name.clone(), entry);
        }

        debug!(record = layout.name(), fields = object.len(), "encoded record");
        json::write_document(&self.config, &JsonValue::Object(object))
    }

    fn put(
        &self,
        cx: &Context,
        kind: Kind,
        type_name: &'static str,
        blob: &[u8],
    ) -> CodecResult<ObjectId> {
        cx.check()?;
        let id = self
            .store
            .put(blob)
            .map_err(CodecError::from)
            .context(|| format!("storing {kind} value of type {type_name}"))?;
        trace!(%kind, id = %id.short_hex(), len = blob.len(), "stored blob");
        Ok(id)
    }
}

/// Follow references down to the first non-reference value.
fn resolve(value: &dyn Value) -> CodecResult<&dyn Value> {
    let mut current = value;
    while current.kind() == Kind::Reference {
        match current.view() {
            View::Reference(Some(pointee)) => current = pointee,
            _ => {
                return Err(CodecError::UnsupportedType {
                    type_name: value.type_name(),
                    reason: "null reference has no representation",
                })
            }
        }
    }
    Ok(current)
}

fn float_text(f: f64, finite: impl FnOnce() -> String) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        finite()
    }
}

fn kind_drift(value: &dyn Value) -> CodecError {
    CodecError::UnsupportedType {
        type_name: value.type_name(),
        reason: "value view does not match its declared kind",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDecl, RecordLayout};
    use crate::value::{Slot, Width};
    use blobtree_store::{ContentHasher, InMemoryBlobStore};
    use std::collections::BTreeMap;
    use std::sync::OnceLock;

    /// Declares two fields but only hands out the first.
    struct Truncated {
        kept: u8,
    }

    impl Record for Truncated {
        fn layout(&self) -> &'static RecordLayout {
            static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
            LAYOUT.get_or_init(|| {
                RecordLayout::new(
                    "Truncated",
                    vec![
                        FieldDecl::new("kept", None, Kind::Uint(Width::W8)),
                        FieldDecl::new("lost", None, Kind::Uint(Width::W8)),
                    ],
                )
            })
        }

        fn field(&self, index: usize) -> Option<&dyn Value> {
            (index == 0).then_some(&self.kept as &dyn Value)
        }

        fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
            (index == 0).then_some(&mut self.kept as &mut dyn Value)
        }
    }

    impl Value for Truncated {
        fn kind(&self) -> Kind {
            Kind::Record
        }

        fn view(&self) -> View<'_> {
            View::Record(self)
        }

        fn slot(&mut self) -> Slot<'_> {
            Slot::Record(self)
        }

        fn is_zero(&self) -> bool {
            self.kept == 0
        }
    }

    fn stored(store: &InMemoryBlobStore, id: &ObjectId) -> Vec<u8> {
        store.fetch(id).unwrap().unwrap()
    }

    #[test]
    fn booleans_have_two_fixed_blobs() {
        let store = InMemoryBlobStore::new();
        let enc = Encoder::new(&store);
        let cx = Context::background();
        let f = enc.encode(&cx, &false).unwrap();
        let t = enc.encode(&cx, &true).unwrap();
        assert!(stored(&store, &f).is_empty());
        assert_eq!(stored(&store, &t), b"true");
    }

    fn assert_blob(enc: &Encoder<'_>, store: &InMemoryBlobStore, value: &dyn Value, expected: &str) {
        let id = enc.encode(&Context::background(), value).unwrap();
        assert_eq!(stored(store, &id), expected.as_bytes());
    }

    #[test]
    fn numbers_are_plain_decimal() {
        let store = InMemoryBlobStore::new();
        let enc = Encoder::new(&store);
        assert_blob(&enc, &store, &-42i8, "-42");
        assert_blob(&enc, &store, &u64::MAX, "18446744073709551615");
        assert_blob(&enc, &store, &0.1f32, "0.1");
        assert_blob(&enc, &store, &1e21f64, "1000000000000000000000");
        assert_blob(&enc, &store, &1e-7f64, "0.0000001");
        assert_blob(&enc, &store, &-0.0f64, "-0");
        assert_blob(&enc, &store, &f64::NAN, "NaN");
        assert_blob(&enc, &store, &f32::NEG_INFINITY, "-Inf");
        assert_blob(&enc, &store, &f64::INFINITY, "+Inf");
    }

    #[test]
    fn text_is_stored_raw() {
        let store = InMemoryBlobStore::new();
        let id = Encoder::new(&store)
            .encode(&Context::background(), &String::from("foo"))
            .unwrap();
        assert_eq!(stored(&store, &id), b"foo");
        assert_eq!(id, ContentHasher::BLOB.hash(b"foo"));
    }

    #[test]
    fn null_top_level_reference_is_unsupported() {
        let store = InMemoryBlobStore::new();
        let none: Option<Option<u8>> = Some(None);
        let err = Encoder::new(&store)
            .encode(&Context::background(), &none)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn references_encode_as_their_pointee() {
        let store = InMemoryBlobStore::new();
        let enc = Encoder::new(&store);
        let cx = Context::background();
        let direct = enc.encode(&cx, &7u32).unwrap();
        let boxed = enc.encode(&cx, &Box::new(Some(7u32))).unwrap();
        assert_eq!(direct, boxed);
    }

    #[test]
    fn empty_containers_store_the_empty_blob() {
        let store = InMemoryBlobStore::new();
        let enc = Encoder::new(&store);
        let cx = Context::background();
        let seq = enc.encode(&cx, &Vec::<u8>::new()).unwrap();
        let map = enc.encode(&cx, &BTreeMap::<String, u8>::new()).unwrap();
        assert_eq!(seq, map);
        assert!(stored(&store, &seq).is_empty());
    }

    #[test]
    fn mapping_blob_is_sorted_object_of_refs() {
        let store = InMemoryBlobStore::new();
        let enc = Encoder::new(&store);
        let cx = Context::background();
        let mut m = BTreeMap::new();
        m.insert("foo".to_string(), 1i64);
        m.insert("bar".to_string(), 2i64);
        let id = enc.encode(&cx, &m).unwrap();

        let one = enc.encode(&cx, &1i64).unwrap();
        let two = enc.encode(&cx, &2i64).unwrap();
        let expected = format!("{{\"bar\":\"{two}\",\"foo\":\"{one}\"}}\n");
        assert_eq!(stored(&store, &id), expected.as_bytes());
    }

    #[test]
    fn config_changes_container_bytes_only() {
        let store = InMemoryBlobStore::new();
        let cx = Context::background();
        let plain = Encoder::new(&store);
        let pretty = Encoder::new(&store).with_config(CodecConfig {
            indent: Some("  ".into()),
            trailing_newline: false,
            ..Default::default()
        });
        assert_eq!(plain.encode(&cx, &5u8).unwrap(), pretty.encode(&cx, &5u8).unwrap());

        let v = vec![5u8];
        let a = plain.encode(&cx, &v).unwrap();
        let b = pretty.encode(&cx, &v).unwrap();
        assert_ne!(a, b);
        let five = plain.encode(&cx, &5u8).unwrap();
        assert_eq!(stored(&store, &b), format!("[\n  \"{five}\"\n]").as_bytes());
    }

    #[test]
    fn record_missing_a_declared_field_fails() {
        let store = InMemoryBlobStore::new();
        let err = Encoder::new(&store)
            .encode(&Context::background(), &Truncated { kept: 1 })
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::NotWritable {
                record: "Truncated",
                field: "lost"
            }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn cancelled_context_stores_nothing() {
        let store = InMemoryBlobStore::new();
        let token = crate::Cancellation::new();
        token.cancel();
        let cx = Context::with_cancellation(token);
        let err = Encoder::new(&store).encode(&cx, &vec![1u8, 2]).unwrap_err();
        assert!(err.is_cancelled());
        assert!(store.is_empty());
    }
}
