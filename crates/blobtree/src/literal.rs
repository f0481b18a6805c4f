//! JSON literals for `inline` fields.
//!
//! An inline field is embedded in its record blob as a plain JSON value
//! rather than a reference. Conversion goes through the value model, so
//! nested records use their own stored names and skip rules.

use serde_json::{Map, Number as JsonNumber, Value as JsonValue};

use crate::error::{CodecError, CodecResult, ResultExt};
use crate::json;
use crate::value::{Slot, Value, View};

/// The JSON literal for `value`.
pub(crate) fn to_literal(value: &dyn Value) -> CodecResult<JsonValue> {
    let literal = match value.view() {
        View::Bool(b) => JsonValue::Bool(b),
        View::Int(n) => JsonValue::from(n),
        View::Uint(n) => JsonValue::from(n),
        View::Float32(f) => {
            if !f.is_finite() {
                return Err(non_finite(value));
            }
            // Parse the shortest f32 rendering so 0.1f32 stays 0.1.
            f.to_string()
                .parse::<JsonNumber>()
                .map(JsonValue::Number)
                .map_err(|_| non_finite(value))?
        }
        View::Float64(f) => JsonNumber::from_f64(f)
            .map(JsonValue::Number)
            .ok_or_else(|| non_finite(value))?,
        View::Text(s) => JsonValue::String(s.to_string()),
        View::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| to_literal(item).context(|| format!("element {i}")))
                .collect::<CodecResult<_>>()?,
        ),
        View::Mapping(entries) => {
            let mut object = Map::new();
            for (key, item) in entries {
                let literal = to_literal(item).context(|| format!("key {key:?}"))?;
                object.insert(key, literal);
            }
            JsonValue::Object(object)
        }
        View::Record(record) => {
            let layout = record.layout();
            let mut object = Map::new();
            for (index, field) in layout.fields().iter().enumerate() {
                if field.spec.skip {
                    continue;
                }
                let item = record
                    .field(index)
                    .ok_or_else(|| layout.inaccessible(index))?;
                if field.spec.omit_if_default && item.is_zero() {
                    continue;
                }
                let literal = to_literal(item).context(|| {
                    format!("field {} of record {}", field.spec.stored_name, layout.name())
                })?;
                object.insert(field.spec.stored_name.clone(), literal);
            }
            JsonValue::Object(object)
        }
        View::Reference(None) => JsonValue::Null,
        View::Reference(Some(pointee)) => to_literal(pointee)?,
        View::Custom(_) => {
            return Err(CodecError::UnsupportedType {
                type_name: value.type_name(),
                reason: "custom values cannot be inlined",
            })
        }
    };
    Ok(literal)
}

fn non_finite(value: &dyn Value) -> CodecError {
    CodecError::UnsupportedType {
        type_name: value.type_name(),
        reason: "non-finite floats have no JSON literal",
    }
}

/// Assign the JSON literal `literal` to `dest`.
///
/// `null` clears a reference and leaves any other destination untouched.
/// Record keys with no matching field are ignored; fields with no key keep
/// their current value.
pub(crate) fn apply_literal(dest: &mut dyn Value, literal: &JsonValue) -> CodecResult<()> {
    let type_name = dest.type_name();
    match (dest.slot(), literal) {
        (Slot::Reference(slot), JsonValue::Null) => slot.clear(),
        (Slot::Reference(slot), literal) => apply_literal(slot.pointee(), literal)?,
        (_, JsonValue::Null) => {}

        (Slot::Bool(b), JsonValue::Bool(v)) => *b = *v,
        (Slot::Number(n), JsonValue::Number(v)) => {
            let text = v.to_string();
            n.parse_text(&text)
                .map_err(|reason| CodecError::parse(n.width_name(), text.as_bytes(), reason))?;
        }
        (Slot::Text(s), JsonValue::String(v)) => *s = v.clone(),

        (Slot::Sequence(seq), JsonValue::Array(items)) => {
            seq.reset(items.len());
            for (i, item) in items.iter().enumerate() {
                // Fixed-length destinations drop excess elements.
                let Some(element) = seq.element(i) else {
                    break;
                };
                apply_literal(element, item).context(|| format!("element {i}"))?;
            }
        }
        (Slot::Mapping(map), JsonValue::Object(entries)) => {
            map.clear();
            for (key, item) in entries {
                map.insert_with(key, &mut |value| apply_literal(value, item))
                    .context(|| format!("key {key:?}"))?;
            }
        }
        (Slot::Record(record), JsonValue::Object(entries)) => {
            let layout = record.layout();
            for (index, field) in layout.fields().iter().enumerate() {
                if field.spec.skip {
                    continue;
                }
                let Some(item) = entries.get(&field.spec.stored_name) else {
                    continue;
                };
                let dest = record
                    .field_mut(index)
                    .ok_or_else(|| layout.inaccessible(index))?;
                apply_literal(dest, item).context(|| {
                    format!("field {} of record {}", field.spec.stored_name, layout.name())
                })?;
            }
        }

        (Slot::Custom(_), _) => {
            return Err(CodecError::UnsupportedType {
                type_name,
                reason: "custom values cannot be inlined",
            })
        }
        (slot, literal) => {
            return Err(CodecError::mismatch(
                slot_expectation(&slot),
                json::describe(literal),
            ))
        }
    }
    Ok(())
}

fn slot_expectation(slot: &Slot<'_>) -> &'static str {
    match slot {
        Slot::Bool(_) => "boolean literal",
        Slot::Number(_) => "number literal",
        Slot::Text(_) => "string literal",
        Slot::Sequence(_) => "array literal",
        Slot::Mapping(_) | Slot::Record(_) => "object literal",
        Slot::Reference(_) => "literal",
        Slot::Custom(_) => "custom value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn scalars_to_literal() {
        assert_eq!(to_literal(&true).unwrap(), json!(true));
        assert_eq!(to_literal(&-7i16).unwrap(), json!(-7));
        assert_eq!(to_literal(&u64::MAX).unwrap(), json!(u64::MAX));
        assert_eq!(to_literal(&0.1f32).unwrap(), json!(0.1));
        assert_eq!(to_literal(&String::from("hi")).unwrap(), json!("hi"));
    }

    #[test]
    fn non_finite_floats_are_unsupported() {
        let err = to_literal(&f64::NAN).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
        assert!(to_literal(&f32::INFINITY).is_err());
    }

    #[test]
    fn containers_and_references_to_literal() {
        let mut m = BTreeMap::new();
        m.insert(3u8, vec![Some(1i32), None]);
        assert_eq!(to_literal(&m).unwrap(), json!({"3": [1, null]}));
        assert_eq!(to_literal(&Vec::<u8>::new()).unwrap(), json!([]));
    }

    #[test]
    fn apply_scalars() {
        let mut n = 0u8;
        apply_literal(&mut n, &json!(200)).unwrap();
        assert_eq!(n, 200);
        let err = apply_literal(&mut n, &json!(300)).unwrap_err();
        assert!(matches!(err, CodecError::Parse { what: "u8", .. }));

        let mut f = 0.0f32;
        apply_literal(&mut f, &json!(2.5)).unwrap();
        assert_eq!(f, 2.5);
    }

    #[test]
    fn apply_null() {
        let mut o = Some(4u32);
        apply_literal(&mut o, &JsonValue::Null).unwrap();
        assert_eq!(o, None);

        let mut s = String::from("kept");
        apply_literal(&mut s, &JsonValue::Null).unwrap();
        assert_eq!(s, "kept");
    }

    #[test]
    fn apply_into_fixed_array_drops_excess() {
        let mut a = [9u8; 2];
        apply_literal(&mut a, &json!([1, 2, 3])).unwrap();
        assert_eq!(a, [1, 2]);
        apply_literal(&mut a, &json!([5])).unwrap();
        assert_eq!(a, [5, 0]);
    }

    #[test]
    fn apply_mismatch() {
        let mut v: Vec<String> = Vec::new();
        let err = apply_literal(&mut v, &json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ShapeMismatch { expected: "array literal", .. }
        ));
    }

    #[test]
    fn apply_nested_mapping() {
        let mut m: BTreeMap<String, Option<Vec<i64>>> = BTreeMap::new();
        apply_literal(&mut m, &json!({"x": [1, 2], "y": null})).unwrap();
        assert_eq!(m.get("x"), Some(&Some(vec![1, 2])));
        assert_eq!(m.get("y"), Some(&None));
    }
}
