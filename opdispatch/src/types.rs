//! Type tags, pattern descriptors and the subtype relation.
//!
//! Rules match on the runtime [`TypeTag`] of each argument. A tag is either
//! a native Rust type (identified by its `TypeId`) or a nominal type the
//! embedding application names itself, such as `Integer` or `Matrix`.
//!
//! Rust has no runtime subtyping, so the "is-instance-of" relation lives in
//! an explicit [`TypeHierarchy`]: a graph of declared direct supertypes.
//! Subtyping is reflexive and transitive over the declared edges. With no
//! declared edges a tag is only an instance of itself.

use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Names of the nominal types in [`TypeHierarchy::numeric`].
pub mod numeric {
    pub const NUMBER: &str = "Number";
    pub const REAL: &str = "Real";
    pub const INTEGER: &str = "Integer";
    pub const SIGNED: &str = "Signed";
    pub const UNSIGNED: &str = "Unsigned";
    pub const FLOAT: &str = "Float";
}

/// A runtime type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A native Rust type.
    Native {
        /// Identity of the type.
        id: TypeId,
        /// Display name, as reported by `std::any::type_name`.
        name: &'static str,
    },
    /// A type named by the embedding application.
    Nominal(Arc<str>),
}

impl TypeTag {
    /// The tag of native type `T`.
    pub fn of<T: Any>() -> Self {
        TypeTag::Native {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// A nominal tag.
    pub fn nominal(name: impl Into<Arc<str>>) -> Self {
        TypeTag::Nominal(name.into())
    }

    /// Look up a primitive or string type by its source name.
    pub fn builtin(name: &str) -> Option<Self> {
        let tag = match name {
            "bool" => Self::of::<bool>(),
            "char" => Self::of::<char>(),
            "i8" => Self::of::<i8>(),
            "i16" => Self::of::<i16>(),
            "i32" => Self::of::<i32>(),
            "i64" => Self::of::<i64>(),
            "i128" => Self::of::<i128>(),
            "isize" => Self::of::<isize>(),
            "u8" => Self::of::<u8>(),
            "u16" => Self::of::<u16>(),
            "u32" => Self::of::<u32>(),
            "u64" => Self::of::<u64>(),
            "u128" => Self::of::<u128>(),
            "usize" => Self::of::<usize>(),
            "f32" => Self::of::<f32>(),
            "f64" => Self::of::<f64>(),
            "String" => Self::of::<String>(),
            "&str" => Self::of::<&'static str>(),
            _ => return None,
        };
        Some(tag)
    }

    /// The display name of this tag.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Native { name, .. } => name,
            TypeTag::Nominal(name) => name,
        }
    }

    /// Check if this tag names a native Rust type.
    pub fn is_native(&self) -> bool {
        matches!(self, TypeTag::Native { .. })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One position of a rule pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Matches any argument.
    Wildcard,
    /// Matches arguments whose tag is a subtype of this one.
    Concrete(TypeTag),
}

impl TypeDescriptor {
    /// Descriptor for native type `T`.
    pub fn of<T: Any>() -> Self {
        TypeDescriptor::Concrete(TypeTag::of::<T>())
    }

    /// Descriptor for a nominal type.
    pub fn nominal(name: impl Into<Arc<str>>) -> Self {
        TypeDescriptor::Concrete(TypeTag::nominal(name))
    }

    /// A pattern of `arity` wildcards.
    pub fn wildcards(arity: usize) -> Vec<Self> {
        vec![TypeDescriptor::Wildcard; arity]
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeDescriptor::Wildcard)
    }

    /// Check if an argument tagged `tag` is admitted at this position.
    pub fn admits(&self, tag: &TypeTag, hierarchy: &TypeHierarchy) -> bool {
        match self {
            TypeDescriptor::Wildcard => true,
            TypeDescriptor::Concrete(expected) => hierarchy.is_subtype(tag, expected),
        }
    }
}

impl From<TypeTag> for TypeDescriptor {
    fn from(tag: TypeTag) -> Self {
        TypeDescriptor::Concrete(tag)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Wildcard => f.write_str("_"),
            TypeDescriptor::Concrete(tag) => write!(f, "{}", tag),
        }
    }
}

/// Errors raised while declaring subtype edges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("declaring `{sub}` <: `{sup}` would create a cycle")]
    Cycle { sub: String, sup: String },
}

/// The declared subtype relation between tags.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    /// Direct supertypes of each tag, in declaration order.
    supertypes: FxHashMap<TypeTag, Vec<TypeTag>>,
}

impl TypeHierarchy {
    /// Create a hierarchy with no declared edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// The numeric tower.
    ///
    /// ```text
    /// i8 i16 i32 i64 i128 isize  <: Signed   <: Integer <: Real <: Number
    /// u8 u16 u32 u64 u128 usize  <: Unsigned <: Integer
    /// f32 f64                    <: Float    <: Real
    /// ```
    pub fn numeric() -> Self {
        use numeric::*;

        let mut hierarchy = Self::new();
        let signed = TypeTag::nominal(SIGNED);
        let unsigned = TypeTag::nominal(UNSIGNED);
        let float = TypeTag::nominal(FLOAT);

        for tag in [
            TypeTag::of::<i8>(),
            TypeTag::of::<i16>(),
            TypeTag::of::<i32>(),
            TypeTag::of::<i64>(),
            TypeTag::of::<i128>(),
            TypeTag::of::<isize>(),
        ] {
            hierarchy.link(tag, signed.clone());
        }
        for tag in [
            TypeTag::of::<u8>(),
            TypeTag::of::<u16>(),
            TypeTag::of::<u32>(),
            TypeTag::of::<u64>(),
            TypeTag::of::<u128>(),
            TypeTag::of::<usize>(),
        ] {
            hierarchy.link(tag, unsigned.clone());
        }
        hierarchy.link(TypeTag::of::<f32>(), float.clone());
        hierarchy.link(TypeTag::of::<f64>(), float.clone());

        hierarchy.link(signed, TypeTag::nominal(INTEGER));
        hierarchy.link(unsigned, TypeTag::nominal(INTEGER));
        hierarchy.link(TypeTag::nominal(INTEGER), TypeTag::nominal(REAL));
        hierarchy.link(float, TypeTag::nominal(REAL));
        hierarchy.link(TypeTag::nominal(REAL), TypeTag::nominal(NUMBER));
        hierarchy
    }

    /// Declare `sub` as a direct subtype of `sup`.
    ///
    /// Repeated declarations of the same edge are ignored. An edge that
    /// would make the relation cyclic, including `sub == sup`, is rejected.
    pub fn declare(&mut self, sub: TypeTag, sup: TypeTag) -> Result<(), HierarchyError> {
        if self.is_subtype(&sup, &sub) {
            return Err(HierarchyError::Cycle {
                sub: sub.name().to_string(),
                sup: sup.name().to_string(),
            });
        }
        self.link(sub, sup);
        Ok(())
    }

    fn link(&mut self, sub: TypeTag, sup: TypeTag) {
        let parents = self.supertypes.entry(sub).or_default();
        if !parents.contains(&sup) {
            parents.push(sup);
        }
    }

    /// Check if `sub` is `sup` or a transitive subtype of it.
    pub fn is_subtype(&self, sub: &TypeTag, sup: &TypeTag) -> bool {
        if sub == sup {
            return true;
        }

        let mut visited: FxHashSet<&TypeTag> = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(tag) = stack.pop() {
            let Some(parents) = self.supertypes.get(tag) else {
                continue;
            };
            for parent in parents {
                if parent == sup {
                    return true;
                }
                if visited.insert(parent) {
                    stack.push(parent);
                }
            }
        }

        false
    }

    /// Direct supertypes declared for `tag`.
    pub fn supertypes(&self, tag: &TypeTag) -> &[TypeTag] {
        self.supertypes.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declared edges.
    pub fn edge_count(&self) -> usize {
        self.supertypes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.supertypes.is_empty()
    }

    /// All declared edges as `(sub, sup)` pairs, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&TypeTag, &TypeTag)> {
        self.supertypes
            .iter()
            .flat_map(|(sub, sups)| sups.iter().map(move |sup| (sub, sup)))
    }

    /// Declared edges keyed by tag name, sorted for stable output.
    pub fn to_name_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (sub, sup) in self.edges() {
            map.entry(sub.name().to_string())
                .or_default()
                .push(sup.name().to_string());
        }
        for sups in map.values_mut() {
            sups.sort();
        }
        map
    }
}
