//! Per-field encoding directives.
//!
//! A record field may carry a directive string, written on the field as
//! `#[blobtree("...")]`:
//!
//! - `"-"` skips the field entirely; it is neither encoded nor decoded.
//! - `"name"` stores the field under `name` instead of its declared name.
//! - `"name,opt,opt"` renames and sets options; `",opt"` only sets options.
//!
//! Options:
//!
//! - `inline` embeds the field's value as a JSON literal in the record blob
//!   instead of storing it as a separate blob.
//! - `external` stores a sequence or mapping field as one blob of its own,
//!   referenced like a scalar. By default such fields are expanded in place
//!   as a list (or object) of element references.
//! - `omitempty` leaves the field out when it holds its zero value.
//!
//! Unrecognized options are ignored. Note that a directive consisting of a
//! bare option word, such as `"inline"`, is a rename, not an option.

/// Encoding policy for one record field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key used for the field in the record blob.
    pub stored_name: String,
    /// Field is invisible to both encode and decode. Overrides every other flag.
    pub skip: bool,
    /// Field value is embedded as a literal.
    pub inline: bool,
    /// Container field is stored as its own blob.
    pub external: bool,
    /// Field is left out while it holds its zero value.
    pub omit_if_default: bool,
}

impl FieldSpec {
    /// A field stored under its declared name with no options.
    pub fn plain(declared: &str) -> Self {
        Self {
            stored_name: declared.to_string(),
            skip: false,
            inline: false,
            external: false,
            omit_if_default: false,
        }
    }

    /// Derive the spec for a field named `declared` carrying `directive`.
    pub fn parse(declared: &str, directive: Option<&str>) -> Self {
        let mut spec = Self::plain(declared);
        match directive {
            None | Some("") => {}
            Some("-") => spec.skip = true,
            Some(directive) => {
                let mut items = directive.split(',');
                if let Some(name) = items.next().filter(|name| !name.is_empty()) {
                    spec.stored_name = name.to_string();
                }
                for item in items {
                    match item {
                        "inline" => spec.inline = true,
                        "external" => spec.external = true,
                        "omitempty" => spec.omit_if_default = true,
                        _ => {}
                    }
                }
            }
        }
        spec
    }
}

/// Derive specs for a record's fields, preserving declaration order.
pub fn field_specs<'a, I>(fields: I) -> Vec<FieldSpec>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    fields
        .into_iter()
        .map(|(declared, directive)| FieldSpec::parse(declared, directive))
        .collect()
}
