//! The value model: the closed set of kinds the codec understands.
//!
//! Every encodable type implements [`Value`]. The encoder reads a value
//! through [`Value::view`], a per-kind projection borrowing the value; the
//! decoder writes through [`Value::slot`], a per-kind mutable destination.
//! Neither side knows anything about concrete Rust types beyond these two
//! enums, which keeps the traversal in [`Encoder`](crate::Encoder) and
//! [`Decoder`](crate::Decoder) kind-generic.

use std::fmt;

use crate::error::CodecResult;
use crate::hook::{Marshal, Unmarshal};
use crate::record::Record;

/// Integer width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
    /// Pointer-sized (`isize` / `usize`).
    Size,
}

/// Float width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

/// The tag identifying which case of the value model a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int(Width),
    Uint(Width),
    Float(FloatWidth),
    Text,
    /// Ordered elements; `fixed_len` is set for fixed-size arrays.
    Sequence { fixed_len: Option<usize> },
    /// Text keys to values.
    Mapping,
    /// Named fields in declaration order.
    Record,
    /// Optional or boxed indirection to another value.
    Reference,
    /// Opts out of generic traversal via [`Marshal`] / [`Unmarshal`].
    Custom,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => write!(f, "bool"),
            Kind::Int(w) => write!(f, "int{}", width_suffix(*w)),
            Kind::Uint(w) => write!(f, "uint{}", width_suffix(*w)),
            Kind::Float(FloatWidth::F32) => write!(f, "float32"),
            Kind::Float(FloatWidth::F64) => write!(f, "float64"),
            Kind::Text => write!(f, "text"),
            Kind::Sequence { fixed_len: None } => write!(f, "sequence"),
            Kind::Sequence { fixed_len: Some(n) } => write!(f, "sequence[{n}]"),
            Kind::Mapping => write!(f, "mapping"),
            Kind::Record => write!(f, "record"),
            Kind::Reference => write!(f, "reference"),
            Kind::Custom => write!(f, "custom"),
        }
    }
}

fn width_suffix(w: Width) -> &'static str {
    match w {
        Width::W8 => "8",
        Width::W16 => "16",
        Width::W32 => "32",
        Width::W64 => "64",
        Width::Size => "",
    }
}

/// A value the codec can encode and decode.
pub trait Value {
    /// The kind of this value. Constant for a given type.
    fn kind(&self) -> Kind;

    /// Read-only projection used by the encoder.
    fn view(&self) -> View<'_>;

    /// Writable projection used by the decoder.
    fn slot(&mut self) -> Slot<'_>;

    /// Whether this value is its kind's zero value.
    fn is_zero(&self) -> bool;

    /// Type name used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// What the encoder sees of a value.
pub enum View<'a> {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float32(f32),
    Float64(f64),
    Text(&'a str),
    /// Elements in order. Empty means absent.
    Sequence(Vec<&'a dyn Value>),
    /// Entries with keys already rendered as text. Empty means absent.
    Mapping(Vec<(String, &'a dyn Value)>),
    Record(&'a dyn Record),
    /// `None` is a null reference.
    Reference(Option<&'a dyn Value>),
    Custom(&'a dyn Marshal),
}

/// Where the decoder writes a value.
pub enum Slot<'a> {
    Bool(&'a mut bool),
    Number(&'a mut dyn Number),
    Text(&'a mut String),
    Sequence(&'a mut dyn SequenceSlot),
    Mapping(&'a mut dyn MappingSlot),
    Record(&'a mut dyn Record),
    Reference(&'a mut dyn ReferenceSlot),
    Custom(&'a mut dyn Unmarshal),
}

/// A numeric destination that parses base-10 text in its own width.
pub trait Number {
    /// Replace the value with the number parsed from `text`.
    fn parse_text(&mut self, text: &str) -> Result<(), String>;

    /// Name of the numeric type, for error messages.
    fn width_name(&self) -> &'static str;
}

/// A sequence destination.
pub trait SequenceSlot {
    /// `Some(n)` for fixed-length arrays.
    fn fixed_len(&self) -> Option<usize>;

    /// Prepare to receive `len` elements.
    ///
    /// Growable sequences become exactly `len` zero values. Fixed-length
    /// sequences ignore `len` and reset every slot to zero.
    fn reset(&mut self, len: usize);

    /// Number of slots currently available.
    fn len(&self) -> usize;

    /// Returns `true` if there are no slots.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`.
    fn element(&mut self, index: usize) -> Option<&mut dyn Value>;
}

/// Fills a freshly allocated mapping value.
pub type Fill<'f> = &'f mut dyn FnMut(&mut dyn Value) -> CodecResult<()>;

/// A mapping destination.
pub trait MappingSlot {
    /// Remove every entry.
    fn clear(&mut self);

    /// Parse `key`, allocate a zero value, let `fill` populate it and insert
    /// the pair.
    fn insert_with(&mut self, key: &str, fill: Fill<'_>) -> CodecResult<()>;
}

/// A reference destination.
pub trait ReferenceSlot {
    /// The pointee, allocated as a zero value if currently absent.
    fn pointee(&mut self) -> &mut dyn Value;

    /// Make the reference absent. Non-nullable references reset their
    /// pointee to zero instead.
    fn clear(&mut self);
}

/// A type usable as a mapping key.
///
/// Keys are stored as JSON object keys, so they always travel as text and
/// are never content-addressed.
pub trait MapKey: Sized {
    fn to_key(&self) -> String;

    fn from_key(key: &str) -> Result<Self, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(Kind::Int(Width::W8).to_string(), "int8");
        assert_eq!(Kind::Uint(Width::Size).to_string(), "uint");
        assert_eq!(Kind::Float(FloatWidth::F32).to_string(), "float32");
        assert_eq!(Kind::Sequence { fixed_len: Some(3) }.to_string(), "sequence[3]");
    }
}
