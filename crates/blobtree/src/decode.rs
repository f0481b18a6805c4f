//! Blob tree → value.

use tracing::{debug, trace};

use blobtree_store::BlobStore;
use blobtree_types::ObjectId;

use crate::context::Context;
use crate::error::{CodecError, CodecResult, ResultExt};
use crate::json;
use crate::literal;
use crate::record::{Record, WireSlot, WireValue};
use crate::value::{Kind, MappingSlot, SequenceSlot, Slot, Value};

/// Reads blob trees back into typed destinations.
#[derive(Clone, Copy)]
pub struct Decoder<'s> {
    store: &'s dyn BlobStore,
}

impl<'s> Decoder<'s> {
    pub fn new(store: &'s dyn BlobStore) -> Self {
        Self { store }
    }

    /// Populate `dest` from the tree rooted at `id`.
    ///
    /// A destination with a custom hook is handed to it unchanged. A
    /// reference destination is allocated if absent and decoded through.
    pub fn decode(&self, cx: &Context, id: &ObjectId, dest: &mut dyn Value) -> CodecResult<()> {
        cx.check()?;
        let kind = dest.kind();

        match dest.slot() {
            Slot::Custom(hook) => hook.unmarshal(cx, self.store, id),
            Slot::Reference(slot) => self.decode(cx, id, slot.pointee()),
            Slot::Bool(b) => {
                // Length decides; any non-empty blob is true.
                *b = !self.fetch(cx, id, kind)?.is_empty();
                Ok(())
            }
            Slot::Number(n) => {
                let blob = self.fetch(cx, id, kind)?;
                let what = n.width_name();
                let text = std::str::from_utf8(&blob)
                    .map_err(|e| CodecError::parse(what, &blob, e))?;
                n.parse_text(text)
                    .map_err(|reason| CodecError::parse(what, &blob, reason))
            }
            Slot::Text(s) => {
                let blob = self.fetch(cx, id, kind)?;
                *s = String::from_utf8(blob)
                    .map_err(|e| CodecError::parse("UTF-8 text", e.as_bytes(), e.utf8_error()))?;
                Ok(())
            }
            Slot::Sequence(seq) => {
                let ids = json::ref_list_blob(&self.fetch(cx, id, kind)?)
                    .context(|| format!("sequence blob {id}"))?;
                self.fill_sequence(cx, seq, &ids)
            }
            Slot::Mapping(map) => {
                let entries = json::ref_map_blob(&self.fetch(cx, id, kind)?)
                    .context(|| format!("mapping blob {id}"))?;
                self.fill_mapping(cx, map, &entries)
            }
            Slot::Record(record) => {
                let blob = self.fetch(cx, id, kind)?;
                self.fill_record(cx, record, &blob)
                    .context(|| format!("record blob {id}"))
            }
        }
    }

    /// Decode the tree rooted at `id` into a fresh `T`.
    pub fn decode_new<T: Value + Default>(&self, cx: &Context, id: &ObjectId) -> CodecResult<T> {
        let mut value = T::default();
        self.decode(cx, id, &mut value)?;
        Ok(value)
    }

    fn fetch(&self, cx: &Context, id: &ObjectId, kind: Kind) -> CodecResult<Vec<u8>> {
        cx.check()?;
        let blob = self
            .store
            .fetch(id)
            .map_err(CodecError::from)
            .and_then(|blob| blob.ok_or(CodecError::MissingBlob(*id)))
            .context(|| format!("fetching {kind} blob {id}"))?;
        trace!(%kind, id = %id.short_hex(), len = blob.len(), "fetched blob");
        Ok(blob)
    }

    /// Growable destinations take exactly `ids.len()` elements. Fixed-length
    /// destinations zero-fill missing slots and ignore excess references.
    fn fill_sequence(
        &self,
        cx: &Context,
        seq: &mut dyn SequenceSlot,
        ids: &[ObjectId],
    ) -> CodecResult<()> {
        seq.reset(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let Some(element) = seq.element(i) else {
                break;
            };
            self.decode(cx, id, element)
                .context(|| format!("element {i}"))?;
        }
        Ok(())
    }

    fn fill_mapping(
        &self,
        cx: &Context,
        map: &mut dyn MappingSlot,
        entries: &[(String, ObjectId)],
    ) -> CodecResult<()> {
        map.clear();
        for (key, id) in entries {
            map.insert_with(key, &mut |value| self.decode(cx, id, value))
                .context(|| format!("key {key:?}"))?;
        }
        Ok(())
    }

    fn fill_record(&self, cx: &Context, record: &mut dyn Record, blob: &[u8]) -> CodecResult<()> {
        let layout = record.layout();
        let wire = layout.parse_wire(blob)?;

        for ((index, field), wire) in layout.fields().iter().enumerate().zip(wire) {
            if field.wire == WireSlot::Skip {
                continue;
            }
            let dest = record
                .field_mut(index)
                .ok_or_else(|| layout.inaccessible(index))?;

            let assigned = match wire {
                // Omitted by the encoder. Containers read as empty; anything
                // else keeps its current value.
                WireValue::Absent => match field.wire {
                    WireSlot::RefList => self.assign_refs(cx, dest, &[]),
                    WireSlot::RefMap => self.assign_ref_map(cx, dest, &[]),
                    _ => Ok(()),
                },
                WireValue::Literal(value) => literal::apply_literal(dest, &value),
                WireValue::Refs(ids) => self.assign_refs(cx, dest, &ids),
                WireValue::RefMap(entries) => self.assign_ref_map(cx, dest, &entries),
                WireValue::Ref(id) => self.decode(cx, &id, dest),
            };
            assigned.context(|| {
                format!(
                    "decoding field {} of record {}",
                    field.spec.stored_name,
                    layout.name()
                )
            })?;
        }

        debug!(record = layout.name(), fields = layout.fields().len(), "decoded record");
        Ok(())
    }

    fn assign_refs(&self, cx: &Context, dest: &mut dyn Value, ids: &[ObjectId]) -> CodecResult<()> {
        match dest.slot() {
            Slot::Sequence(seq) => self.fill_sequence(cx, seq, ids),
            _ => Err(CodecError::mismatch("sequence destination", "array of references")),
        }
    }

    fn assign_ref_map(
        &self,
        cx: &Context,
        dest: &mut dyn Value,
        entries: &[(String, ObjectId)],
    ) -> CodecResult<()> {
        match dest.slot() {
            Slot::Mapping(map) => self.fill_mapping(cx, map, entries),
            _ => Err(CodecError::mismatch("mapping destination", "object of references")),
        }
    }
}
