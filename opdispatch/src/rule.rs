//! A single dispatch rule.
//!
//! A [`Rule`] pairs a type pattern with a handler and an optional selector.
//! Rules are immutable once built: the pattern, handler and selector are
//! fixed at construction.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::types::{TypeDescriptor, TypeHierarchy};
use crate::value::{NamedArgs, Value};

/// A handler invoked when its rule matches.
///
/// Handlers are shared so one externally owned callable can back rules in
/// several tables.
pub type Handler<R> = Arc<dyn Fn(&[Value], &NamedArgs) -> R + Send + Sync>;

/// Errors raised while building a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("selector index {index} is out of range for a pattern of arity {arity}")]
    SelectorOutOfRange { index: usize, arity: usize },
}

/// A pattern, a handler and an argument selector.
pub struct Rule<R> {
    pattern: Box<[TypeDescriptor]>,
    handler: Handler<R>,
    /// Positions of the incoming arguments to hand to the handler, in order.
    /// `None` passes the arguments through unchanged.
    selector: Option<Box<[usize]>>,
}

impl<R> Rule<R> {
    /// Create a rule that passes arguments through unchanged.
    pub fn new<F>(pattern: impl Into<Vec<TypeDescriptor>>, handler: F) -> Self
    where
        F: Fn(&[Value], &NamedArgs) -> R + Send + Sync + 'static,
    {
        Self {
            pattern: pattern.into().into_boxed_slice(),
            handler: Arc::new(handler),
            selector: None,
        }
    }

    /// Create a rule that hands the arguments at `selector` to `handler`.
    ///
    /// Selector `[4, 2]` turns arguments `a0..a5` into `(a4, a2)`. Indices
    /// may repeat. Every index must address a pattern position.
    pub fn with_selector<F>(
        pattern: impl Into<Vec<TypeDescriptor>>,
        handler: F,
        selector: impl Into<Vec<usize>>,
    ) -> Result<Self, RuleError>
    where
        F: Fn(&[Value], &NamedArgs) -> R + Send + Sync + 'static,
    {
        Self::from_parts(pattern, Arc::new(handler), Some(selector.into()))
    }

    /// Create a rule from an already shared handler.
    pub fn from_parts(
        pattern: impl Into<Vec<TypeDescriptor>>,
        handler: Handler<R>,
        selector: Option<Vec<usize>>,
    ) -> Result<Self, RuleError> {
        let pattern = pattern.into().into_boxed_slice();

        if let Some(selector) = &selector {
            let arity = pattern.len();
            if let Some(&index) = selector.iter().find(|&&index| index >= arity) {
                return Err(RuleError::SelectorOutOfRange { index, arity });
            }
        }

        Ok(Self {
            pattern,
            handler,
            selector: selector.map(Vec::into_boxed_slice),
        })
    }

    pub fn pattern(&self) -> &[TypeDescriptor] {
        &self.pattern
    }

    /// Number of arguments this rule accepts.
    pub fn arity(&self) -> usize {
        self.pattern.len()
    }

    pub fn selector(&self) -> Option<&[usize]> {
        self.selector.as_deref()
    }

    /// Check if `args` match this rule's pattern.
    ///
    /// A rule matches only tuples of exactly its arity, and each position
    /// must be a wildcard or admit the argument's runtime tag.
    pub fn matches(&self, args: &[Value], hierarchy: &TypeHierarchy) -> bool {
        if args.len() != self.pattern.len() {
            return false;
        }

        self.pattern
            .iter()
            .zip(args)
            .all(|(descriptor, arg)| descriptor.admits(arg.type_tag(), hierarchy))
    }

    /// Invoke the handler, applying the selector first if there is one.
    ///
    /// The pattern is not checked here; callers are expected to have
    /// confirmed [`Rule::matches`]. Whatever the handler returns is passed
    /// back unchanged.
    ///
    /// # Panics
    ///
    /// Panics if a selector index is out of bounds for `args`. This cannot
    /// happen for arguments that match the pattern, since selectors are
    /// checked against the pattern arity at construction.
    pub fn invoke(&self, args: &[Value], named: &NamedArgs) -> R {
        match &self.selector {
            None => (self.handler)(args, named),
            Some(selector) => {
                let selected: Vec<Value> = selector.iter().map(|&i| args[i].clone()).collect();
                (self.handler)(&selected, named)
            }
        }
    }
}

impl<R> fmt::Debug for Rule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl<R> fmt::Display for Rule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, descriptor) in self.pattern.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", descriptor)?;
        }
        write!(f, ")")?;
        if let Some(selector) = &self.selector {
            write!(f, " take {:?}", selector)?;
        }
        Ok(())
    }
}
