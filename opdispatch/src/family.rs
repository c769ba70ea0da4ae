//! Operator families: four parallel dispatch tables for one operation.
//!
//! An element-wise operation is invoked in four ways: directly, as a
//! reduction, as an accumulation, and as an outer product. Each way gets its
//! own [`DispatchTable`]. Registering an [`Operation`] inserts one rule into
//! each table, all sharing the same pattern and selector and each routed to
//! the corresponding method of the operation.
//!
//! The four tables are independent. Inserting directly into one of them
//! through [`OperatorFamily::table_mut`] leaves the other three unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::result::DispatchResult;
use crate::rule::{Handler, Rule, RuleError};
use crate::table::DispatchTable;
use crate::types::{TypeDescriptor, TypeHierarchy};
use crate::value::{NamedArgs, Value};

/// The ways an operator family can be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    /// Element-wise application.
    Direct,
    /// Fold along an axis.
    Reduce,
    /// Running fold, keeping intermediate results.
    Accumulate,
    /// Application to every pair drawn from two inputs.
    Outer,
}

impl DispatchKind {
    pub const ALL: [DispatchKind; 4] = [
        DispatchKind::Direct,
        DispatchKind::Reduce,
        DispatchKind::Accumulate,
        DispatchKind::Outer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchKind::Direct => "direct",
            DispatchKind::Reduce => "reduce",
            DispatchKind::Accumulate => "accumulate",
            DispatchKind::Outer => "outer",
        }
    }

    /// Name of this kind's table within the family `family`.
    fn table_name(self, family: &str) -> String {
        match self {
            DispatchKind::Direct => family.to_string(),
            kind => format!("{}.{}", family, kind.as_str()),
        }
    }

    fn apply<R, O>(self, op: &O, args: &[Value], named: &NamedArgs) -> R
    where
        O: Operation<R> + ?Sized,
    {
        match self {
            DispatchKind::Direct => op.call(args, named),
            DispatchKind::Reduce => op.reduce(args, named),
            DispatchKind::Accumulate => op.accumulate(args, named),
            DispatchKind::Outer => op.outer(args, named),
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An implementation providing all four invocation forms.
pub trait Operation<R>: Send + Sync {
    fn call(&self, args: &[Value], named: &NamedArgs) -> R;
    fn reduce(&self, args: &[Value], named: &NamedArgs) -> R;
    fn accumulate(&self, args: &[Value], named: &NamedArgs) -> R;
    fn outer(&self, args: &[Value], named: &NamedArgs) -> R;
}

/// A named operation with one dispatch table per [`DispatchKind`].
pub struct OperatorFamily<R> {
    name: String,
    direct: DispatchTable<R>,
    reduce: DispatchTable<R>,
    accumulate: DispatchTable<R>,
    outer: DispatchTable<R>,
}

impl<R> OperatorFamily<R> {
    /// Create a family whose tables match by exact type identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_hierarchy(name, Arc::new(TypeHierarchy::new()))
    }

    /// Create a family whose tables all match through `hierarchy`.
    pub fn with_hierarchy(name: impl Into<String>, hierarchy: Arc<TypeHierarchy>) -> Self {
        let name = name.into();
        let table = |kind: DispatchKind| {
            DispatchTable::with_hierarchy(Arc::clone(&hierarchy)).with_name(kind.table_name(&name))
        };

        Self {
            direct: table(DispatchKind::Direct),
            reduce: table(DispatchKind::Reduce),
            accumulate: table(DispatchKind::Accumulate),
            outer: table(DispatchKind::Outer),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self, kind: DispatchKind) -> &DispatchTable<R> {
        match kind {
            DispatchKind::Direct => &self.direct,
            DispatchKind::Reduce => &self.reduce,
            DispatchKind::Accumulate => &self.accumulate,
            DispatchKind::Outer => &self.outer,
        }
    }

    pub fn table_mut(&mut self, kind: DispatchKind) -> &mut DispatchTable<R> {
        match kind {
            DispatchKind::Direct => &mut self.direct,
            DispatchKind::Reduce => &mut self.reduce,
            DispatchKind::Accumulate => &mut self.accumulate,
            DispatchKind::Outer => &mut self.outer,
        }
    }

    /// Dispatch through the table for `kind`.
    pub fn dispatch(&self, kind: DispatchKind, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        self.table(kind).call(args, named)
    }

    pub fn call(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        self.dispatch(DispatchKind::Direct, args, named)
    }

    pub fn reduce(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        self.dispatch(DispatchKind::Reduce, args, named)
    }

    pub fn accumulate(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        self.dispatch(DispatchKind::Accumulate, args, named)
    }

    pub fn outer(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        self.dispatch(DispatchKind::Outer, args, named)
    }
}

impl<R: 'static> OperatorFamily<R> {
    /// Register `op` in all four tables with the highest precedence.
    ///
    /// The rules are built before any is inserted, so a bad selector leaves
    /// every table unchanged.
    pub fn add_operation<O>(
        &mut self,
        op: Arc<O>,
        pattern: impl Into<Vec<TypeDescriptor>>,
        selector: Option<Vec<usize>>,
    ) -> Result<(), RuleError>
    where
        O: Operation<R> + ?Sized + 'static,
    {
        let pattern: Vec<TypeDescriptor> = pattern.into();

        let mut rules = Vec::with_capacity(DispatchKind::ALL.len());
        for kind in DispatchKind::ALL {
            let op = Arc::clone(&op);
            let handler: Handler<R> =
                Arc::new(move |args: &[Value], named: &NamedArgs| kind.apply(&*op, args, named));
            rules.push((kind, Rule::from_parts(pattern.clone(), handler, selector.clone())?));
        }

        debug!("Adding operation to `{}` with pattern {:?}", self.name, pattern);
        for (kind, rule) in rules {
            self.table_mut(kind).insert(rule);
        }
        Ok(())
    }
}

impl<R> fmt::Debug for OperatorFamily<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorFamily")
            .field("name", &self.name)
            .field("direct", &self.direct.len())
            .field("reduce", &self.reduce.len())
            .field("accumulate", &self.accumulate.len())
            .field("outer", &self.outer.len())
            .finish()
    }
}
