//! Runtime argument values.
//!
//! Arguments cross the dispatch boundary type-erased. Each [`Value`] keeps
//! the [`TypeTag`] it was created with so rules can match on it without
//! knowing the concrete payload type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::TypeTag;

/// Keyword arguments passed through to handlers untouched.
pub type NamedArgs = IndexMap<String, Value>;

/// A type-erased, reference-counted argument value.
///
/// Cloning a `Value` clones the handle, not the payload.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    tag: TypeTag,
}

impl Value {
    /// Wrap `value`, tagging it with its native Rust type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            tag: TypeTag::of::<T>(),
        }
    }

    /// Wrap `value` under an explicit tag.
    ///
    /// Used for embedding-defined types whose payload representation
    /// (e.g. a `Vec<f64>` backing a `Matrix`) is not the type rules should
    /// dispatch on.
    pub fn tagged<T: Any + Send + Sync>(value: T, tag: TypeTag) -> Self {
        Self {
            inner: Arc::new(value),
            tag,
        }
    }

    /// The runtime type tag of this value.
    pub fn type_tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Check whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).is::<T>()
    }

    /// Borrow the payload as a `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Check whether two values share the same payload allocation.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.tag.name())
    }
}
