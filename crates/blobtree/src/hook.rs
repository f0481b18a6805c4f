//! Custom encode/decode hooks.
//!
//! A type that implements [`Marshal`] and [`Unmarshal`] and reports
//! [`Kind::Custom`](crate::Kind::Custom) replaces the generic algorithm for
//! itself and everything beneath it. The encoder and decoder check for a
//! custom view or slot before any kind-based dispatch.
//!
//! [`impl_custom_value!`](crate::impl_custom_value) wires a hook pair into
//! the value model.

use blobtree_store::BlobStore;
use blobtree_types::ObjectId;

use crate::context::Context;
use crate::error::CodecResult;

/// A value that knows how to store itself.
pub trait Marshal {
    /// Store `self` into `store` and return the root ID.
    fn marshal(&self, cx: &Context, store: &dyn BlobStore) -> CodecResult<ObjectId>;
}

/// A value that knows how to populate itself from a store.
pub trait Unmarshal {
    /// Replace `self` with the value rooted at `id`.
    fn unmarshal(&mut self, cx: &Context, store: &dyn BlobStore, id: &ObjectId)
        -> CodecResult<()>;
}

/// Implement [`Value`](crate::Value) for a type with custom hooks.
///
/// The type must implement [`Marshal`], [`Unmarshal`], `Default` and
/// `PartialEq`; its zero value is `Default::default()`.
///
/// ```ignore
/// impl_custom_value!(Celsius);
/// ```
#[macro_export]
macro_rules! impl_custom_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Value for $ty {
            fn kind(&self) -> $crate::Kind {
                $crate::Kind::Custom
            }

            fn view(&self) -> $crate::View<'_> {
                $crate::View::Custom(self)
            }

            fn slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Custom(self)
            }

            fn is_zero(&self) -> bool {
                *self == <$ty as ::std::default::Default>::default()
            }
        }
    )+};
}
