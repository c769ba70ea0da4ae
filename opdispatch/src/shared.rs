//! A dispatch table that can be shared between threads.
//!
//! [`DispatchTable`] itself does no locking. When rules are inserted while
//! other threads call the table, wrap it in a [`SharedDispatchTable`]:
//! inserts take the write lock, calls take the read lock only long enough to
//! pick the winning rule. The handler runs after the lock is released, so a
//! handler may insert further rules into the same table.

use parking_lot::RwLock;

use crate::result::DispatchResult;
use crate::rule::{Rule, RuleError};
use crate::table::DispatchTable;
use crate::types::TypeDescriptor;
use crate::value::{NamedArgs, Value};

/// A [`DispatchTable`] behind a read-write lock.
#[derive(Debug)]
pub struct SharedDispatchTable<R> {
    table: RwLock<DispatchTable<R>>,
}

impl<R> SharedDispatchTable<R> {
    pub fn new(table: DispatchTable<R>) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Insert `rule` with the highest precedence.
    pub fn insert(&self, rule: Rule<R>) {
        self.table.write().insert(rule);
    }

    /// Build a rule from its parts and insert it with the highest precedence.
    pub fn add<F>(
        &self,
        pattern: impl Into<Vec<TypeDescriptor>>,
        handler: F,
        selector: Option<Vec<usize>>,
    ) -> Result<(), RuleError>
    where
        F: Fn(&[Value], &NamedArgs) -> R + Send + Sync + 'static,
    {
        self.table.write().add(pattern, handler, selector)
    }

    /// Invoke the highest-precedence rule matching `args`.
    ///
    /// Sees every insert that completed before the call started.
    pub fn call(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        let rule = self.table.read().resolve_shared(args);
        match rule {
            Some(rule) => DispatchResult::Handled(rule.invoke(args, named)),
            None => DispatchResult::NoMatch,
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Consume the wrapper and return the table.
    pub fn into_inner(self) -> DispatchTable<R> {
        self.table.into_inner()
    }
}

impl<R> Default for SharedDispatchTable<R> {
    fn default() -> Self {
        Self::new(DispatchTable::new())
    }
}

impl<R> From<DispatchTable<R>> for SharedDispatchTable<R> {
    fn from(table: DispatchTable<R>) -> Self {
        Self::new(table)
    }
}
