//! Records and their wire shape.
//!
//! A record blob is a JSON object keyed by stored field names. What sits
//! under each key depends on the field's policy and kind:
//!
//! | field                              | stored as                    |
//! |------------------------------------|------------------------------|
//! | `inline`                           | JSON literal of the value    |
//! | sequence, not `external`           | array of element references  |
//! | mapping, not `external`            | object of value references   |
//! | anything else                      | one reference string         |
//!
//! Decoding cannot tell these apart from the bytes alone, so every record
//! type carries a [`RecordLayout`], computed once on first use, that says
//! which [`WireSlot`] each field occupies. The decoder parses the blob
//! against the layout into [`WireValue`]s before touching the destination.

use serde_json::Value as JsonValue;

use blobtree_types::ObjectId;

use crate::error::{CodecError, CodecResult, ResultExt};
use crate::json;
use crate::policy::{field_specs, FieldSpec};
use crate::value::{Kind, Value};

/// A struct with named fields, usually implemented with
/// `#[derive(Record)]`.
pub trait Record {
    /// The layout shared by every value of this type.
    fn layout(&self) -> &'static RecordLayout;

    /// The field at `index` in declaration order.
    fn field(&self, index: usize) -> Option<&dyn Value>;

    /// The writable field at `index` in declaration order.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value>;
}

/// A field as declared on the record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub directive: Option<&'static str>,
    pub kind: Kind,
}

impl FieldDecl {
    pub fn new(name: &'static str, directive: Option<&'static str>, kind: Kind) -> Self {
        Self {
            name,
            directive,
            kind,
        }
    }
}

/// How a field is represented inside its record blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireSlot {
    /// Not stored.
    Skip,
    /// JSON literal.
    Literal,
    /// Array of references, one per element.
    RefList,
    /// Object of references, one per entry.
    RefMap,
    /// A single reference.
    Ref,
}

impl WireSlot {
    fn for_field(spec: &FieldSpec, kind: Kind) -> Self {
        if spec.skip {
            WireSlot::Skip
        } else if spec.inline {
            WireSlot::Literal
        } else if spec.external {
            WireSlot::Ref
        } else {
            match kind {
                Kind::Sequence { .. } => WireSlot::RefList,
                Kind::Mapping => WireSlot::RefMap,
                _ => WireSlot::Ref,
            }
        }
    }
}

/// One field of a [`RecordLayout`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub declared: &'static str,
    pub kind: Kind,
    pub spec: FieldSpec,
    pub wire: WireSlot,
}

/// Field policies and wire slots for a record type, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    name: &'static str,
    fields: Vec<FieldLayout>,
}

impl RecordLayout {
    pub fn new(name: &'static str, decls: Vec<FieldDecl>) -> Self {
        let specs = field_specs(decls.iter().map(|decl| (decl.name, decl.directive)));
        let fields = decls
            .into_iter()
            .zip(specs)
            .map(|(decl, spec)| {
                let wire = WireSlot::for_field(&spec, decl.kind);
                FieldLayout {
                    declared: decl.name,
                    kind: decl.kind,
                    spec,
                    wire,
                }
            })
            .collect();
        Self { name, fields }
    }

    /// Record type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Error for a `Record` impl that returned no value for field `index`.
    pub(crate) fn inaccessible(&self, index: usize) -> CodecError {
        CodecError::NotWritable {
            record: self.name,
            field: self.fields.get(index).map_or("?", |f| f.declared),
        }
    }

    /// Parse a record blob into one [`WireValue`] per field.
    ///
    /// Keys with no matching field are ignored. A field whose key is absent
    /// (or `null`) yields [`WireValue::Absent`]; skipped fields always do.
    pub fn parse_wire(&self, blob: &[u8]) -> CodecResult<Vec<WireValue>> {
        let doc = json::parse_document(blob)?;
        let mut object = match doc {
            JsonValue::Object(object) => object,
            other => return Err(CodecError::mismatch("record object", json::describe(&other))),
        };

        self.fields
            .iter()
            .map(|field| {
                if field.wire == WireSlot::Skip {
                    return Ok(WireValue::Absent);
                }
                let raw = match object.remove(&field.spec.stored_name) {
                    None | Some(JsonValue::Null) => return Ok(WireValue::Absent),
                    Some(raw) => raw,
                };
                let parsed = match field.wire {
                    WireSlot::Skip => Ok(WireValue::Absent),
                    WireSlot::Literal => Ok(WireValue::Literal(raw)),
                    WireSlot::RefList => json::refs_from_json(&raw).map(WireValue::Refs),
                    WireSlot::RefMap => json::ref_map_from_json(&raw).map(WireValue::RefMap),
                    WireSlot::Ref => json::ref_from_json(&raw).map(WireValue::Ref),
                };
                parsed.context(|| format!("field {} of record {}", field.spec.stored_name, self.name))
            })
            .collect()
    }
}

/// A record field as found in a stored blob, before decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    /// Key missing or `null`: the encoder omitted the field.
    Absent,
    Literal(JsonValue),
    Refs(Vec<ObjectId>),
    RefMap(Vec<(String, ObjectId)>),
    Ref(ObjectId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Width;

    fn layout() -> RecordLayout {
        RecordLayout::new(
            "Sample",
            vec![
                FieldDecl::new("count", None, Kind::Int(Width::W64)),
                FieldDecl::new("tags", None, Kind::Sequence { fixed_len: None }),
                FieldDecl::new("blob", Some(",external"), Kind::Sequence { fixed_len: None }),
                FieldDecl::new("attrs", None, Kind::Mapping),
                FieldDecl::new("flag", Some(",inline"), Kind::Bool),
                FieldDecl::new("secret", Some("-"), Kind::Text),
            ],
        )
    }

    #[test]
    fn wire_slots_follow_policy_and_kind() {
        let slots: Vec<_> = layout().fields().iter().map(|f| f.wire).collect();
        assert_eq!(
            slots,
            [
                WireSlot::Ref,
                WireSlot::RefList,
                WireSlot::Ref,
                WireSlot::RefMap,
                WireSlot::Literal,
                WireSlot::Skip,
            ]
        );
    }

    #[test]
    fn inline_wins_over_external() {
        let layout = RecordLayout::new(
            "R",
            vec![FieldDecl::new("v", Some(",inline,external"), Kind::Mapping)],
        );
        assert_eq!(layout.fields()[0].wire, WireSlot::Literal);
    }

    #[test]
    fn inaccessible_names_the_declared_field() {
        let layout = layout();
        let err = layout.inaccessible(1);
        assert!(matches!(err, CodecError::NotWritable { record: "Sample", field: "tags" }));
        assert_eq!(err.to_string(), "record Sample does not expose field tags");
    }

    #[test]
    fn parse_wire_classifies_each_key() {
        let a = ObjectId::from_bytes(b"a");
        let b = ObjectId::from_bytes(b"b");
        let blob = format!(
            r#"{{"count":"{a}","tags":["{a}","{b}"],"attrs":{{"k":"{b}"}},"flag":true,"secret":"ignored","extra":1}}"#
        );
        let wire = layout().parse_wire(blob.as_bytes()).unwrap();
        assert_eq!(wire[0], WireValue::Ref(a));
        assert_eq!(wire[1], WireValue::Refs(vec![a, b]));
        assert_eq!(wire[2], WireValue::Absent);
        assert_eq!(wire[3], WireValue::RefMap(vec![("k".into(), b)]));
        assert_eq!(wire[4], WireValue::Literal(JsonValue::Bool(true)));
        assert_eq!(wire[5], WireValue::Absent);
    }

    #[test]
    fn parse_wire_reports_shape_mismatch_with_field() {
        let a = ObjectId::from_bytes(b"a");
        let blob = format!(r#"{{"count":["{a}"]}}"#);
        let err = layout().parse_wire(blob.as_bytes()).unwrap_err();
        assert!(matches!(err.root(), CodecError::ShapeMismatch { .. }));
        assert!(err.to_string().starts_with("field count of record Sample"));
    }

    #[test]
    fn parse_wire_rejects_non_object() {
        let err = layout().parse_wire(b"[1,2]").unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn parse_wire_rejects_malformed_json() {
        let err = layout().parse_wire(b"{\"count\":").unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
    }
}
