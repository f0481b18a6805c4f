//! JSON text of container and record blobs.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as JsonValue};

use blobtree_types::ObjectId;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult, ResultExt};

/// Render `doc` as blob bytes according to `config`.
pub(crate) fn write_document(config: &CodecConfig, doc: &JsonValue) -> CodecResult<Vec<u8>> {
    config.validate()?;
    let mut out = Vec::new();
    let written = match &config.indent {
        Some(indent) => {
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            doc.serialize(&mut ser)
        }
        None => serde_json::to_writer(&mut out, doc),
    };
    written.map_err(|e| CodecError::Parse {
        what: "JSON output",
        input: String::new(),
        reason: e.to_string(),
    })?;

    let mut out = escape(out, config.escape_html);
    if config.trailing_newline {
        out.push(b'\n');
    }
    Ok(out)
}

/// Escape HTML-significant characters (if asked) and the two Unicode line
/// terminators that are valid in JSON but not in JavaScript source.
///
/// Every byte matched here can only occur inside a JSON string.
fn escape(out: Vec<u8>, html: bool) -> Vec<u8> {
    let needs_escape = out.iter().enumerate().any(|(i, &b)| {
        (html && matches!(b, b'<' | b'>' | b'&')) || is_line_terminator(&out[i..])
    });
    if !needs_escape {
        return out;
    }

    let mut escaped = Vec::with_capacity(out.len() + 16);
    let mut i = 0;
    while i < out.len() {
        match out[i] {
            b'<' if html => escaped.extend_from_slice(br"\u003c"),
            b'>' if html => escaped.extend_from_slice(br"\u003e"),
            b'&' if html => escaped.extend_from_slice(br"\u0026"),
            _ if is_line_terminator(&out[i..]) => {
                escaped.extend_from_slice(if out[i + 2] == 0xA8 {
                    br"\u2028"
                } else {
                    br"\u2029"
                });
                i += 3;
                continue;
            }
            b => escaped.push(b),
        }
        i += 1;
    }
    escaped
}

// U+2028 and U+2029 encode as E2 80 A8 and E2 80 A9.
fn is_line_terminator(bytes: &[u8]) -> bool {
    matches!(bytes, [0xE2, 0x80, 0xA8 | 0xA9, ..])
}

pub(crate) fn parse_document(blob: &[u8]) -> CodecResult<JsonValue> {
    serde_json::from_slice(blob).map_err(|e| CodecError::parse("JSON document", blob, e))
}

/// Name of a JSON value's type, for mismatch messages.
pub(crate) fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub(crate) fn ref_to_json(id: &ObjectId) -> JsonValue {
    JsonValue::String(id.to_string())
}

pub(crate) fn refs_to_json(ids: &[ObjectId]) -> JsonValue {
    JsonValue::Array(ids.iter().map(ref_to_json).collect())
}

pub(crate) fn ref_map_to_json(entries: Vec<(String, ObjectId)>) -> JsonValue {
    JsonValue::Object(
        entries
            .into_iter()
            .map(|(key, id)| (key, ref_to_json(&id)))
            .collect::<Map<_, _>>(),
    )
}

pub(crate) fn ref_from_json(value: &JsonValue) -> CodecResult<ObjectId> {
    match value {
        JsonValue::String(text) => ObjectId::parse(text)
            .map_err(|e| CodecError::parse("object reference", text.as_bytes(), e)),
        other => Err(CodecError::mismatch("reference string", describe(other))),
    }
}

/// `null` is accepted as the empty list.
pub(crate) fn refs_from_json(value: &JsonValue) -> CodecResult<Vec<ObjectId>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| ref_from_json(item).context(|| format!("element {i}")))
            .collect(),
        other => Err(CodecError::mismatch("array of references", describe(other))),
    }
}

/// `null` is accepted as the empty object.
pub(crate) fn ref_map_from_json(value: &JsonValue) -> CodecResult<Vec<(String, ObjectId)>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Object(entries) => entries
            .iter()
            .map(|(key, item)| {
                let id = ref_from_json(item).context(|| format!("key {key:?}"))?;
                Ok((key.clone(), id))
            })
            .collect(),
        other => Err(CodecError::mismatch("object of references", describe(other))),
    }
}

/// References held by a sequence container blob. The empty blob is the
/// absent sequence.
pub(crate) fn ref_list_blob(blob: &[u8]) -> CodecResult<Vec<ObjectId>> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    refs_from_json(&parse_document(blob)?)
}

/// Entries held by a mapping container blob. The empty blob is the absent
/// mapping.
pub(crate) fn ref_map_blob(blob: &[u8]) -> CodecResult<Vec<(String, ObjectId)>> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    ref_map_from_json(&parse_document(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compact() -> CodecConfig {
        CodecConfig {
            trailing_newline: false,
            ..Default::default()
        }
    }

    #[test]
    fn default_output_is_compact_with_newline() {
        let out = write_document(&CodecConfig::default(), &json!({"b": 1, "a": [true]})).unwrap();
        assert_eq!(out, b"{\"a\":[true],\"b\":1}\n");
    }

    #[test]
    fn indent_pretty_prints() {
        let config = CodecConfig {
            indent: Some("\t".into()),
            ..compact()
        };
        let out = write_document(&config, &json!(["x", "y"])).unwrap();
        assert_eq!(out, b"[\n\t\"x\",\n\t\"y\"\n]");
    }

    #[test]
    fn html_escaping_is_opt_in() {
        let doc = json!({"<k>": "a&b"});
        assert_eq!(write_document(&compact(), &doc).unwrap(), br#"{"<k>":"a&b"}"#);
        let config = CodecConfig {
            escape_html: true,
            ..compact()
        };
        assert_eq!(
            write_document(&config, &doc).unwrap(),
            br#"{"\u003ck\u003e":"a\u0026b"}"#
        );
    }

    #[test]
    fn non_whitespace_indent_is_rejected() {
        let config = CodecConfig {
            escape_html: true,
            indent: Some("&".into()),
            ..Default::default()
        };
        let err = write_document(&config, &json!(["x"])).unwrap_err();
        assert!(matches!(err, CodecError::Config(_)));
    }

    #[test]
    fn line_terminators_are_always_escaped() {
        let out = write_document(&compact(), &json!(["a\u{2028}b\u{2029}"])).unwrap();
        assert_eq!(out, br#"["a\u2028b\u2029"]"#);
        let back: JsonValue = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, json!(["a\u{2028}b\u{2029}"]));
    }

    #[test]
    fn ref_list_accepts_empty_blob_and_null() {
        assert!(ref_list_blob(b"").unwrap().is_empty());
        assert!(ref_list_blob(b"null\n").unwrap().is_empty());
        assert!(ref_map_blob(b"null").unwrap().is_empty());
    }

    #[test]
    fn ref_list_round_trip() {
        let ids = vec![ObjectId::from_bytes(b"1"), ObjectId::from_bytes(b"2")];
        let out = write_document(&CodecConfig::default(), &refs_to_json(&ids)).unwrap();
        assert_eq!(ref_list_blob(&out).unwrap(), ids);
    }

    #[test]
    fn ref_list_element_errors_name_the_index() {
        let id = ObjectId::from_bytes(b"1");
        let blob = format!(r#"["{id}", 7]"#);
        let err = ref_list_blob(blob.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("element 1: "));
        assert!(matches!(err.root(), CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn ref_map_rejects_array() {
        let err = ref_map_blob(b"[]").unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn bad_reference_text_is_a_parse_error() {
        let err = ref_from_json(&json!("sha1-00")).unwrap_err();
        assert!(matches!(err, CodecError::Parse { what: "object reference", .. }));
    }
}
