//! [`Value`] implementations for standard library types.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{CodecError, CodecResult};
use crate::value::{
    FloatWidth, Fill, Kind, MapKey, MappingSlot, Number, ReferenceSlot, SequenceSlot, Slot, Value,
    View, Width,
};

impl Value for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn view(&self) -> View<'_> {
        View::Bool(*self)
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Bool(self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $kind:ident($width:ident) as $view:ident($wide:ty)),* $(,)?) => {$(
        impl Value for $ty {
            fn kind(&self) -> Kind {
                Kind::$kind(Width::$width)
            }

            fn view(&self) -> View<'_> {
                View::$view(*self as $wide)
            }

            fn slot(&mut self) -> Slot<'_> {
                Slot::Number(self)
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }

        impl Number for $ty {
            fn parse_text(&mut self, text: &str) -> Result<(), String> {
                *self = text.parse::<$ty>().map_err(|e| e.to_string())?;
                Ok(())
            }

            fn width_name(&self) -> &'static str {
                stringify!($ty)
            }
        }

        impl MapKey for $ty {
            fn to_key(&self) -> String {
                self.to_string()
            }

            fn from_key(key: &str) -> Result<Self, String> {
                key.parse::<$ty>().map_err(|e| e.to_string())
            }
        }
    )*};
}

impl_integer! {
    i8 => Int(W8) as Int(i64),
    i16 => Int(W16) as Int(i64),
    i32 => Int(W32) as Int(i64),
    i64 => Int(W64) as Int(i64),
    isize => Int(Size) as Int(i64),
    u8 => Uint(W8) as Uint(u64),
    u16 => Uint(W16) as Uint(u64),
    u32 => Uint(W32) as Uint(u64),
    u64 => Uint(W64) as Uint(u64),
    usize => Uint(Size) as Uint(u64),
}

macro_rules! impl_float {
    ($($ty:ty => $width:ident, $view:ident),* $(,)?) => {$(
        impl Value for $ty {
            fn kind(&self) -> Kind {
                Kind::Float(FloatWidth::$width)
            }

            fn view(&self) -> View<'_> {
                View::$view(*self)
            }

            fn slot(&mut self) -> Slot<'_> {
                Slot::Number(self)
            }

            // Negative zero is not the zero value.
            fn is_zero(&self) -> bool {
                self.to_bits() == 0
            }
        }

        impl Number for $ty {
            fn parse_text(&mut self, text: &str) -> Result<(), String> {
                let parsed = text.parse::<$ty>().map_err(|e| e.to_string())?;
                // `parse` saturates to infinity instead of failing.
                if parsed.is_infinite() && !spells_infinity(text) {
                    return Err(format!("value out of range for {}", stringify!($ty)));
                }
                *self = parsed;
                Ok(())
            }

            fn width_name(&self) -> &'static str {
                stringify!($ty)
            }
        }
    )*};
}

impl_float! {
    f32 => F32, Float32,
    f64 => F64, Float64,
}

fn spells_infinity(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

impl Value for String {
    fn kind(&self) -> Kind {
        Kind::Text
    }

    fn view(&self) -> View<'_> {
        View::Text(self)
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Text(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl MapKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Result<Self, String> {
        Ok(key.to_string())
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<T: Value + Default> Value for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::Sequence { fixed_len: None }
    }

    fn view(&self) -> View<'_> {
        View::Sequence(self.iter().map(|e| e as &dyn Value).collect())
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Sequence(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Value + Default> SequenceSlot for Vec<T> {
    fn fixed_len(&self) -> Option<usize> {
        None
    }

    fn reset(&mut self, len: usize) {
        self.clear();
        self.resize_with(len, T::default);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&mut self, index: usize) -> Option<&mut dyn Value> {
        self.get_mut(index).map(|e| e as &mut dyn Value)
    }
}

impl<T: Value + Default, const N: usize> Value for [T; N] {
    fn kind(&self) -> Kind {
        Kind::Sequence { fixed_len: Some(N) }
    }

    fn view(&self) -> View<'_> {
        View::Sequence(self.iter().map(|e| e as &dyn Value).collect())
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Sequence(self)
    }

    fn is_zero(&self) -> bool {
        self.iter().all(Value::is_zero)
    }
}

impl<T: Value + Default, const N: usize> SequenceSlot for [T; N] {
    fn fixed_len(&self) -> Option<usize> {
        Some(N)
    }

    fn reset(&mut self, _len: usize) {
        for e in self.iter_mut() {
            *e = T::default();
        }
    }

    fn len(&self) -> usize {
        N
    }

    fn element(&mut self, index: usize) -> Option<&mut dyn Value> {
        self.get_mut(index).map(|e| e as &mut dyn Value)
    }
}

// ---------------------------------------------------------------------------
// Mappings
// ---------------------------------------------------------------------------

fn parse_key<K: MapKey>(key: &str) -> CodecResult<K> {
    K::from_key(key).map_err(|reason| CodecError::parse("mapping key", key.as_bytes(), reason))
}

impl<K, V> Value for HashMap<K, V>
where
    K: MapKey + Eq + Hash,
    V: Value + Default,
{
    fn kind(&self) -> Kind {
        Kind::Mapping
    }

    fn view(&self) -> View<'_> {
        View::Mapping(
            self.iter()
                .map(|(k, v)| (k.to_key(), v as &dyn Value))
                .collect(),
        )
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Mapping(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> MappingSlot for HashMap<K, V>
where
    K: MapKey + Eq + Hash,
    V: Value + Default,
{
    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn insert_with(&mut self, key: &str, fill: Fill<'_>) -> CodecResult<()> {
        let key = parse_key::<K>(key)?;
        let mut value = V::default();
        fill(&mut value)?;
        self.insert(key, value);
        Ok(())
    }
}

impl<K, V> Value for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Value + Default,
{
    fn kind(&self) -> Kind {
        Kind::Mapping
    }

    fn view(&self) -> View<'_> {
        View::Mapping(
            self.iter()
                .map(|(k, v)| (k.to_key(), v as &dyn Value))
                .collect(),
        )
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Mapping(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> MappingSlot for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Value + Default,
{
    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn insert_with(&mut self, key: &str, fill: Fill<'_>) -> CodecResult<()> {
        let key = parse_key::<K>(key)?;
        let mut value = V::default();
        fill(&mut value)?;
        self.insert(key, value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

impl<T: Value + Default> Value for Option<T> {
    fn kind(&self) -> Kind {
        Kind::Reference
    }

    fn view(&self) -> View<'_> {
        View::Reference(self.as_ref().map(|v| v as &dyn Value))
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Reference(self)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Value + Default> ReferenceSlot for Option<T> {
    fn pointee(&mut self) -> &mut dyn Value {
        self.get_or_insert_with(T::default)
    }

    fn clear(&mut self) {
        *self = None;
    }
}

impl<T: Value + Default> Value for Box<T> {
    fn kind(&self) -> Kind {
        Kind::Reference
    }

    fn view(&self) -> View<'_> {
        View::Reference(Some(&**self))
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Reference(self)
    }

    // A box always points somewhere, so it is never the zero value.
    fn is_zero(&self) -> bool {
        false
    }
}

impl<T: Value + Default> ReferenceSlot for Box<T> {
    fn pointee(&mut self) -> &mut dyn Value {
        &mut **self
    }

    fn clear(&mut self) {
        **self = T::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_kinds_and_views() {
        assert_eq!(7i8.kind(), Kind::Int(Width::W8));
        assert_eq!(7usize.kind(), Kind::Uint(Width::Size));
        assert!(matches!((-3i16).view(), View::Int(-3)));
        assert!(matches!(u64::MAX.view(), View::Uint(u64::MAX)));
    }

    #[test]
    fn number_parse_respects_width() {
        let mut n = 0i8;
        assert!(n.parse_text("127").is_ok());
        assert_eq!(n, 127);
        assert!(n.parse_text("128").is_err());
        assert_eq!(n, 127);

        let mut u = 0u16;
        assert!(u.parse_text("-1").is_err());
        assert_eq!(u.width_name(), "u16");
    }

    #[test]
    fn float_zero_excludes_negative_zero() {
        assert!(0.0f64.is_zero());
        assert!(!(-0.0f64).is_zero());
        assert!(!f32::NAN.is_zero());
    }

    #[test]
    fn float_parse_accepts_non_finite_spellings() {
        let mut f = 0.0f64;
        f.parse_text("+Inf").unwrap();
        assert_eq!(f, f64::INFINITY);
        f.parse_text("-Inf").unwrap();
        assert_eq!(f, f64::NEG_INFINITY);
        f.parse_text("NaN").unwrap();
        assert!(f.is_nan());
        f.parse_text("infinity").unwrap();
        assert_eq!(f, f64::INFINITY);
    }

    #[test]
    fn float_parse_rejects_overflow() {
        let mut f = 1.5f32;
        assert!(f.parse_text("1e300").is_err());
        assert!(f.parse_text("-3.5e38").is_err());
        assert_eq!(f, 1.5);
        f.parse_text("3.4e38").unwrap();
        assert!(f.is_finite());

        let mut d = 0.0f64;
        assert!(d.parse_text("1e309").is_err());
        d.parse_text("1e300").unwrap();
        assert_eq!(d, 1e300);
    }

    #[test]
    fn vec_reset_resizes_with_zero_values() {
        let mut v = vec![5u8, 6, 7];
        SequenceSlot::reset(&mut v, 2);
        assert_eq!(v, vec![0, 0]);
        assert!(v.element(2).is_none());
    }

    #[test]
    fn array_reset_zeroes_every_slot() {
        let mut a = [1i32, 2, 3];
        SequenceSlot::reset(&mut a, 1);
        assert_eq!(a, [0, 0, 0]);
        assert_eq!(a.fixed_len(), Some(3));
        assert!([0u8; 4].is_zero());
        assert!(![0u8, 1].is_zero());
    }

    #[test]
    fn map_keys_round_trip_as_text() {
        let mut m: BTreeMap<i32, String> = BTreeMap::new();
        m.insert_with("-4", &mut |v| {
            if let Slot::Text(s) = v.slot() {
                s.push_str("neg");
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(m.get(&-4).map(String::as_str), Some("neg"));
        assert!(m.insert_with("four", &mut |_| Ok(())).is_err());
    }

    #[test]
    fn option_pointee_allocates() {
        let mut o: Option<u32> = None;
        assert!(o.is_zero());
        if let Slot::Number(n) = o.pointee().slot() {
            n.parse_text("9").unwrap();
        }
        assert_eq!(o, Some(9));
        ReferenceSlot::clear(&mut o);
        assert_eq!(o, None);
    }

    #[test]
    fn box_is_never_zero() {
        let mut b = Box::new(0u8);
        assert!(!b.is_zero());
        ReferenceSlot::clear(&mut b);
        assert_eq!(*b, 0);
    }
}
