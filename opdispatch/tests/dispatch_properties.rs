//! Property tests for dispatch matching and precedence.
//!
//! These exercise the public API end to end: rules built from patterns and
//! selectors, tables scanned newest-first, and the `NoMatch` outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use opdispatch::{
    DispatchResult, DispatchTable, NamedArgs, Rule, TypeDescriptor, TypeHierarchy, TypeTag, Value,
};
use proptest::prelude::*;

/// Values of a few distinct runtime types.
fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::new),
        any::<bool>().prop_map(Value::new),
        any::<f64>().prop_map(Value::new),
        "[a-z]{0,4}".prop_map(Value::new),
        Just(Value::tagged((), TypeTag::nominal("Unit"))),
    ]
}

fn values(max: usize) -> impl Strategy<Value = Vec<Value>> {
    proptest::collection::vec(value(), 0..max)
}

/// Descriptors drawn from the same types as `value`, plus the wildcard.
fn descriptor() -> impl Strategy<Value = TypeDescriptor> {
    prop_oneof![
        Just(TypeDescriptor::Wildcard),
        Just(TypeDescriptor::of::<i64>()),
        Just(TypeDescriptor::of::<bool>()),
        Just(TypeDescriptor::of::<f64>()),
        Just(TypeDescriptor::of::<String>()),
        Just(TypeDescriptor::nominal("Unit")),
    ]
}

/// A handler returning the rule's label and the arguments it received.
fn recorder(label: usize) -> impl Fn(&[Value], &NamedArgs) -> (usize, Vec<Value>) + Send + Sync {
    move |args: &[Value], _: &NamedArgs| (label, args.to_vec())
}

fn same_payloads(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Value::ptr_eq(x, y))
}

proptest! {
    #[test]
    fn length_gate(pattern in proptest::collection::vec(descriptor(), 0..5), args in values(6)) {
        prop_assume!(pattern.len() != args.len());
        let rule = Rule::new(pattern, recorder(0));
        prop_assert!(!rule.matches(&args, &TypeHierarchy::new()));
    }

    #[test]
    fn wildcard_universality(args in values(6)) {
        let rule = Rule::new(TypeDescriptor::wildcards(args.len()), recorder(0));
        prop_assert!(rule.matches(&args, &TypeHierarchy::new()));
    }

    #[test]
    fn matches_is_idempotent(pattern in proptest::collection::vec(descriptor(), 0..4), args in values(4)) {
        let rule = Rule::new(pattern, recorder(0));
        let h = TypeHierarchy::numeric();
        prop_assert_eq!(rule.matches(&args, &h), rule.matches(&args, &h));
    }

    #[test]
    fn last_inserted_match_wins(args in values(5), extra in 0usize..4) {
        let mut table = DispatchTable::new();
        table.insert(Rule::new(TypeDescriptor::wildcards(args.len()), recorder(1)));
        table.insert(Rule::new(TypeDescriptor::wildcards(args.len()), recorder(2)));
        // Rules of other arities never interfere
        table.insert(Rule::new(TypeDescriptor::wildcards(args.len() + 1 + extra), recorder(3)));

        match table.call_positional(&args) {
            DispatchResult::Handled((label, received)) => {
                prop_assert_eq!(label, 2);
                prop_assert!(same_payloads(&received, &args));
            }
            DispatchResult::NoMatch => prop_assert!(false, "expected a match"),
        }
    }

    #[test]
    fn selector_permutes(args in proptest::collection::vec(value(), 1..6), picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..6)) {
        let selector: Vec<usize> = picks.iter().map(|i| i.index(args.len())).collect();
        let rule = Rule::with_selector(TypeDescriptor::wildcards(args.len()), recorder(0), selector.clone()).unwrap();

        let (_, received) = rule.invoke(&args, &NamedArgs::new());
        let expected: Vec<Value> = selector.iter().map(|&i| args[i].clone()).collect();
        prop_assert!(same_payloads(&received, &expected));
    }

    #[test]
    fn no_selector_passthrough(args in values(6)) {
        let rule = Rule::new(TypeDescriptor::wildcards(args.len()), recorder(0));
        let (_, received) = rule.invoke(&args, &NamedArgs::new());
        prop_assert!(same_payloads(&received, &args));
    }

    #[test]
    fn exhaustion_invokes_nothing(args in values(4)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut table = DispatchTable::new();
        for arity in 0..4 {
            if arity == args.len() {
                continue;
            }
            let calls = Arc::clone(&calls);
            table.insert(Rule::new(TypeDescriptor::wildcards(arity), move |_: &[Value], _: &NamedArgs| {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }

        prop_assert!(table.call_positional(&args).is_no_match());
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tables_are_independent(args in values(4)) {
        let mut first = DispatchTable::new();
        let mut second = DispatchTable::new();
        second.insert(Rule::new(TypeDescriptor::wildcards(args.len()), recorder(7)));

        for label in 0..3 {
            first.insert(Rule::new(TypeDescriptor::wildcards(args.len()), recorder(label)));
        }

        prop_assert_eq!(second.len(), 1);
        prop_assert_eq!(second.call_positional(&args).handled().map(|(label, _)| label), Some(7));
    }
}

#[test]
fn scenario_insertion_order_beats_specificity() {
    let mut table = DispatchTable::new();
    table.insert(Rule::new(
        vec![TypeDescriptor::of::<i64>(), TypeDescriptor::of::<i64>()],
        |_: &[Value], _: &NamedArgs| "int-int",
    ));
    table.insert(Rule::new(TypeDescriptor::wildcards(2), |_: &[Value], _: &NamedArgs| "any-any"));

    let result = table.call_positional(&[Value::new(1i64), Value::new(2i64)]);
    assert_eq!(result, DispatchResult::Handled("any-any"));
}

#[test]
fn scenario_length_mismatch() {
    let mut table = DispatchTable::new();
    table.insert(Rule::new(vec![TypeDescriptor::of::<i64>()], |_: &[Value], _: &NamedArgs| "int"));

    let result = table.call_positional(&[Value::new(1i64), Value::new(2i64)]);
    assert_eq!(result, DispatchResult::NoMatch);
}

#[test]
fn scenario_reversed_subtraction() {
    let subtract = |args: &[Value], _: &NamedArgs| -> Result<i64, String> {
        match (args[0].downcast_ref::<i64>(), args[1].downcast_ref::<i64>()) {
            (Some(a), Some(b)) => Ok(a - b),
            _ => Err("subtract expects integers".to_string()),
        }
    };

    let mut table = DispatchTable::new();
    table.insert(Rule::with_selector(TypeDescriptor::wildcards(2), subtract, [1, 0]).unwrap());

    assert_eq!(
        table.call_positional(&[Value::new(10i64), Value::new(3i64)]),
        DispatchResult::Handled(Ok(-7))
    );

    // Handler failures come back exactly as the handler produced them
    assert_eq!(
        table.call_positional(&[Value::new(10i64), Value::new("3")]),
        DispatchResult::Handled(Err("subtract expects integers".to_string()))
    );
}

#[test]
fn scenario_empty_table() {
    let table: DispatchTable<()> = DispatchTable::new();
    assert_eq!(table.call_positional(&[Value::new(1i64)]), DispatchResult::NoMatch);
}
