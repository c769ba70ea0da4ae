//! The operator registry.
//!
//! An [`OperatorRegistry`] maps operation names to [`OperatorFamily`]s. The
//! embedding application builds it once during startup and hands it to
//! whatever routes operator calls. Nothing is registered implicitly.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::family::{DispatchKind, OperatorFamily};
use crate::result::{DispatchError, DispatchResult};
use crate::types::TypeHierarchy;
use crate::value::{NamedArgs, Value};

/// Operator families by name, in registration order.
pub struct OperatorRegistry<R> {
    hierarchy: Arc<TypeHierarchy>,
    families: IndexMap<String, OperatorFamily<R>>,
}

impl<R> OperatorRegistry<R> {
    /// Create an empty registry whose families match through `hierarchy`.
    pub fn new(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self {
            hierarchy,
            families: IndexMap::new(),
        }
    }

    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    /// Get the family called `name`, creating an empty one if needed.
    pub fn family_mut(&mut self, name: &str) -> &mut OperatorFamily<R> {
        let hierarchy = &self.hierarchy;
        self.families.entry(name.to_string()).or_insert_with(|| {
            debug!("Creating operator family `{}`", name);
            OperatorFamily::with_hierarchy(name, Arc::clone(hierarchy))
        })
    }

    /// Install `family` under its own name, returning the one it replaces.
    ///
    /// A replaced family keeps its position in [`OperatorRegistry::names`].
    pub fn install(&mut self, family: OperatorFamily<R>) -> Option<OperatorFamily<R>> {
        debug!("Installing operator family `{}`", family.name());
        self.families.insert(family.name().to_string(), family)
    }

    pub fn get(&self, name: &str) -> Option<&OperatorFamily<R>> {
        self.families.get(name)
    }

    /// Registered operation names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.families.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Dispatch `args` through the `kind` table of the family `name`.
    pub fn dispatch(
        &self,
        name: &str,
        kind: DispatchKind,
        args: &[Value],
        named: &NamedArgs,
    ) -> Result<DispatchResult<R>, DispatchError> {
        let Some(family) = self.families.get(name) else {
            trace!("No operator family named `{}`", name);
            return Err(DispatchError::UnknownOperation {
                name: name.to_string(),
            });
        };
        Ok(family.dispatch(kind, args, named))
    }
}

impl<R> Default for OperatorRegistry<R> {
    fn default() -> Self {
        Self::new(Arc::new(TypeHierarchy::new()))
    }
}
