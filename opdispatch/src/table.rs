//! The precedence-ordered dispatch table.
//!
//! A [`DispatchTable`] scans its rules newest-first and invokes the first
//! one whose pattern matches the arguments. There is no specificity
//! ranking: a later, more general rule shadows an earlier, more specific
//! one. Callers layer overrides by inserting them last.
//!
//! The scan is linear and uncached. Tables are expected to hold a handful
//! of rules each.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::result::{DispatchError, DispatchResult};
use crate::rule::{Handler, Rule, RuleError};
use crate::types::{TypeDescriptor, TypeHierarchy};
use crate::value::{NamedArgs, Value};

const ANONYMOUS: &str = "<anonymous>";

/// An ordered collection of rules implementing multiple dispatch.
pub struct DispatchTable<R> {
    /// Used in logs and in `NoMatch` errors.
    name: Option<String>,
    /// Subtype relation consulted when matching patterns.
    hierarchy: Arc<TypeHierarchy>,
    /// Stored oldest first and scanned in reverse, so the most recently
    /// inserted rule has the highest precedence.
    rules: Vec<Arc<Rule<R>>>,
}

impl<R> DispatchTable<R> {
    /// Create an empty table matching by exact type identity.
    pub fn new() -> Self {
        Self::with_hierarchy(Arc::new(TypeHierarchy::new()))
    }

    /// Create an empty table matching through `hierarchy`.
    pub fn with_hierarchy(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self {
            name: None,
            hierarchy,
            rules: Vec::new(),
        }
    }

    /// Create an empty, named table matching by exact type identity.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    /// Insert `rule` with the highest precedence.
    ///
    /// No uniqueness check is made. A rule with the same pattern as an
    /// existing one shadows it.
    pub fn insert(&mut self, rule: Rule<R>) {
        debug!("Inserting rule {} into `{}` at precedence 0", rule, self.label());
        self.rules.push(Arc::new(rule));
    }

    /// Build a rule from its parts and insert it with the highest precedence.
    pub fn add<F>(
        &mut self,
        pattern: impl Into<Vec<TypeDescriptor>>,
        handler: F,
        selector: Option<Vec<usize>>,
    ) -> Result<(), RuleError>
    where
        F: Fn(&[Value], &NamedArgs) -> R + Send + Sync + 'static,
    {
        self.add_shared(pattern, Arc::new(handler), selector)
    }

    /// Like [`DispatchTable::add`], for a handler that is already shared.
    pub fn add_shared(
        &mut self,
        pattern: impl Into<Vec<TypeDescriptor>>,
        handler: Handler<R>,
        selector: Option<Vec<usize>>,
    ) -> Result<(), RuleError> {
        let rule = Rule::from_parts(pattern, handler, selector)?;
        self.insert(rule);
        Ok(())
    }

    /// Rules in precedence order, highest first.
    pub fn rules(&self) -> impl Iterator<Item = &Rule<R>> + '_ {
        self.rules.iter().rev().map(|rule| &**rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule that would handle `args`, without invoking it.
    pub fn resolve(&self, args: &[Value]) -> Option<&Rule<R>> {
        self.rules().find(|rule| rule.matches(args, &self.hierarchy))
    }

    pub(crate) fn resolve_shared(&self, args: &[Value]) -> Option<Arc<Rule<R>>> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(args, &self.hierarchy))
            .cloned()
    }

    /// Invoke the highest-precedence rule matching `args`.
    ///
    /// Returns [`DispatchResult::NoMatch`] without invoking anything when no
    /// rule matches.
    pub fn call(&self, args: &[Value], named: &NamedArgs) -> DispatchResult<R> {
        trace!("Dispatching `{}` over {} rules with {:?}", self.label(), self.rules.len(), args);

        match self.resolve(args) {
            Some(rule) => {
                trace!("`{}` matched rule {}", self.label(), rule);
                DispatchResult::Handled(rule.invoke(args, named))
            }
            None => {
                trace!("No rule of `{}` matches {:?}", self.label(), args);
                DispatchResult::NoMatch
            }
        }
    }

    /// [`DispatchTable::call`] with no keyword arguments.
    pub fn call_positional(&self, args: &[Value]) -> DispatchResult<R> {
        self.call(args, &NamedArgs::new())
    }

    /// [`DispatchTable::call`], reporting `NoMatch` as an error.
    pub fn try_call(&self, args: &[Value], named: &NamedArgs) -> Result<R, DispatchError> {
        self.call(args, named).into_result(self.label(), args)
    }
}

impl<R> Default for DispatchTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for DispatchTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("name", &self.name)
            .field("rules", &self.rules().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::types::numeric;

    fn constant(label: &'static str) -> impl Fn(&[Value], &NamedArgs) -> &'static str + Send + Sync {
        move |_: &[Value], _: &NamedArgs| label
    }

    fn int(v: i64) -> Value {
        Value::new(v)
    }

    #[test]
    fn test_last_inserted_wins_over_more_specific() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(
            vec![TypeDescriptor::of::<i64>(), TypeDescriptor::of::<i64>()],
            constant("int-int"),
        ));
        table.insert(Rule::new(TypeDescriptor::wildcards(2), constant("any-any")));

        assert_eq!(table.call_positional(&[int(1), int(2)]), DispatchResult::Handled("any-any"));
    }

    #[test]
    fn test_earlier_rule_used_when_later_does_not_match() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(TypeDescriptor::wildcards(2), constant("any-any")));
        table.insert(Rule::new(
            vec![TypeDescriptor::of::<i64>(), TypeDescriptor::of::<i64>()],
            constant("int-int"),
        ));

        assert_eq!(table.call_positional(&[int(1), int(2)]), DispatchResult::Handled("int-int"));
        assert_eq!(
            table.call_positional(&[int(1), Value::new(2.0f64)]),
            DispatchResult::Handled("any-any")
        );
    }

    #[test]
    fn test_length_mismatch_is_no_match() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(vec![TypeDescriptor::of::<i64>()], constant("int")));

        assert_eq!(table.call_positional(&[int(1), int(2)]), DispatchResult::NoMatch);
    }

    #[test]
    fn test_selector_reverses_subtraction() {
        let mut table = DispatchTable::new();
        table
            .add(
                TypeDescriptor::wildcards(2),
                |args: &[Value], _: &NamedArgs| {
                    let a = args[0].downcast_ref::<i64>().copied().unwrap_or_default();
                    let b = args[1].downcast_ref::<i64>().copied().unwrap_or_default();
                    a - b
                },
                Some(vec![1, 0]),
            )
            .unwrap();

        assert_eq!(table.call_positional(&[int(10), int(3)]), DispatchResult::Handled(-7));
    }

    #[test]
    fn test_empty_table() {
        let table: DispatchTable<()> = DispatchTable::new();
        assert!(table.is_empty());
        assert_eq!(table.call_positional(&[int(1)]), DispatchResult::NoMatch);
    }

    #[test]
    fn test_no_match_invokes_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut table = DispatchTable::new();
        table.insert(Rule::new(vec![TypeDescriptor::of::<String>()], move |_: &[Value], _: &NamedArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(table.call_positional(&[int(1)]).is_no_match());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(table.call_positional(&[Value::new(String::from("s"))]).is_handled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut first = DispatchTable::new();
        let mut second = DispatchTable::new();
        first.insert(Rule::new(TypeDescriptor::wildcards(1), constant("first")));
        second.insert(Rule::new(TypeDescriptor::wildcards(1), constant("second")));

        first.insert(Rule::new(TypeDescriptor::wildcards(1), constant("first-override")));

        assert_eq!(second.len(), 1);
        assert_eq!(second.call_positional(&[int(0)]), DispatchResult::Handled("second"));
        assert_eq!(first.call_positional(&[int(0)]), DispatchResult::Handled("first-override"));
    }

    #[test]
    fn test_rules_in_precedence_order() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(TypeDescriptor::wildcards(1), constant("a")));
        table.insert(Rule::new(TypeDescriptor::wildcards(2), constant("b")));
        table.insert(Rule::new(TypeDescriptor::wildcards(3), constant("c")));

        let arities: Vec<_> = table.rules().map(Rule::arity).collect();
        assert_eq!(arities, vec![3, 2, 1]);
    }

    #[test]
    fn test_resolve_does_not_invoke() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(vec![TypeDescriptor::of::<bool>()], |_: &[Value], _: &NamedArgs| {
            panic!("resolve must not invoke the handler")
        }));

        let rule = table.resolve(&[Value::new(true)]);
        assert_eq!(rule.map(Rule::arity), Some(1));
        assert!(table.resolve(&[int(1)]).is_none());
    }

    #[test]
    fn test_hierarchy_matching() {
        let mut table = DispatchTable::with_hierarchy(Arc::new(TypeHierarchy::numeric()));
        table.insert(Rule::new(vec![TypeDescriptor::nominal(numeric::REAL)], constant("real")));
        table.insert(Rule::new(vec![TypeDescriptor::nominal(numeric::INTEGER)], constant("integer")));

        assert_eq!(table.call_positional(&[Value::new(3u16)]), DispatchResult::Handled("integer"));
        assert_eq!(table.call_positional(&[Value::new(0.5f64)]), DispatchResult::Handled("real"));
        assert_eq!(table.call_positional(&[Value::new("text")]), DispatchResult::NoMatch);
    }

    #[test]
    fn test_named_args_reach_handler() {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(TypeDescriptor::wildcards(1), |_: &[Value], named: &NamedArgs| {
            named.keys().cloned().collect::<Vec<_>>()
        }));

        let mut named = NamedArgs::new();
        named.insert("axis".to_string(), int(0));
        named.insert("dtype".to_string(), Value::new("f64"));

        assert_eq!(
            table.call(&[int(1)], &named),
            DispatchResult::Handled(vec!["axis".to_string(), "dtype".to_string()])
        );
    }

    #[test]
    fn test_try_call_reports_table_name() {
        let table: DispatchTable<()> = DispatchTable::named("maximum");
        let err = table.try_call(&[Value::new(1.5f32)], &NamedArgs::new()).unwrap_err();

        assert_eq!(
            err,
            DispatchError::NoMatch {
                operation: "maximum".to_string(),
                arg_types: vec!["f32".to_string()],
            }
        );
    }

    #[test]
    fn test_add_rejects_bad_selector() {
        let mut table = DispatchTable::new();
        let err = table
            .add(TypeDescriptor::wildcards(1), constant("x"), Some(vec![1]))
            .unwrap_err();

        assert_eq!(err, RuleError::SelectorOutOfRange { index: 1, arity: 1 });
        assert!(table.is_empty());
    }

    #[test]
    fn test_shared_handler_across_tables() {
        let handler: Handler<usize> = Arc::new(|args: &[Value], _: &NamedArgs| args.len());
        let mut direct = DispatchTable::new();
        let mut reversed = DispatchTable::new();

        direct.add_shared(TypeDescriptor::wildcards(2), Arc::clone(&handler), None).unwrap();
        reversed.add_shared(TypeDescriptor::wildcards(2), handler, Some(vec![1])).unwrap();

        assert_eq!(direct.call_positional(&[int(1), int(2)]), DispatchResult::Handled(2));
        assert_eq!(reversed.call_positional(&[int(1), int(2)]), DispatchResult::Handled(1));
    }
}
