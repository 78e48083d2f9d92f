//! Property-based tests for sift using proptest.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use sift::{conjoin, disjoin, ops, Document, FilterInstance, FilterSpec, Op, Value};

// ============================================================================
// Test helpers
// ============================================================================

fn field_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Strings and numbers: what every comparison factory accepts.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        (-1.0e9..1.0e9f64).prop_map(Value::from),
        "[a-zA-Z ]{0,12}".prop_map(Value::from),
    ]
}

/// Small single-key fragments over a handful of fields, so collisions happen.
fn fragment_strategy() -> impl Strategy<Value = Document> {
    ("[a-d]", any::<i32>())
        .prop_map(|(field, n)| Document::from([(field, Value::from(n))]))
}

fn spec() -> FilterSpec {
    FilterSpec::create([
        ("A", ops::eq("a").unwrap()),
        ("B", ops::gte("b").unwrap()),
        ("C", ops::is_in("c").unwrap()),
    ])
    .unwrap()
}

fn count_changes(filter: &mut FilterInstance) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let clone = hits.clone();
    filter.subscribe(move || clone.set(clone.get() + 1));
    hits
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Comparison fragments constrain exactly the bound field.
    #[test]
    fn comparison_fragment_has_one_key(field in field_strategy(), value in scalar_strategy()) {
        let converters = [
            ops::eq(field.as_str()).unwrap(),
            ops::ne(field.as_str()).unwrap(),
        ];
        for conv in converters {
            let fragment = conv.convert(&value).unwrap().into_document().unwrap();
            prop_assert_eq!(fragment.len(), 1);
            prop_assert!(fragment.contains_key(&field));
        }
    }

    /// Ordering operators accept every integer and keep it as operand.
    #[test]
    fn ordering_fragment_keeps_operand(field in field_strategy(), n in any::<i64>()) {
        for (conv, op) in [
            (ops::gt(field.as_str()).unwrap(), Op::Gt),
            (ops::gte(field.as_str()).unwrap(), Op::Gte),
            (ops::lt(field.as_str()).unwrap(), Op::Lt),
            (ops::lte(field.as_str()).unwrap(), Op::Lte),
        ] {
            let fragment = conv.convert(&Value::from(n)).unwrap().into_document().unwrap();
            let operand = fragment[field.as_str()].as_document().unwrap();
            prop_assert_eq!(&operand[op.as_str()], &Value::from(n));
        }
    }

    /// `$in` and `$nin` are kept whatever the array length, even one.
    #[test]
    fn membership_never_degrades(
        field in field_strategy(),
        items in prop::collection::vec(scalar_strategy(), 0..4),
    ) {
        let array = Value::Array(items);
        for (conv, op) in [
            (ops::is_in(field.as_str()).unwrap(), Op::In),
            (ops::not_in(field.as_str()).unwrap(), Op::Nin),
        ] {
            let fragment = conv.convert(&array).unwrap().into_document().unwrap();
            let operand = fragment[field.as_str()].as_document().unwrap();
            prop_assert_eq!(operand.len(), 1);
            prop_assert_eq!(&operand[op.as_str()], &array);
        }
    }

    /// Merging never drops a fragment: flattened keys plus overflow
    /// account for every input.
    #[test]
    fn conjoin_keeps_every_fragment(
        fragments in prop::collection::vec(fragment_strategy(), 0..8),
    ) {
        let merged = conjoin(fragments.clone());
        let overflow = merged
            .get(Op::And.as_str())
            .and_then(Value::as_array)
            .map_or(0, <[Value]>::len);
        let flattened = merged.len() - usize::from(overflow > 0);
        prop_assert_eq!(flattened + overflow, fragments.len());

        // the first fragment is always flattened
        if let Some(first) = fragments.first() {
            for (key, value) in first {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
    }

    /// Fragments over distinct fields merge without `$and`.
    #[test]
    fn conjoin_distinct_fields_flatten(values in prop::collection::vec(any::<i32>(), 0..6)) {
        let fragments: Vec<Document> = values
            .iter()
            .enumerate()
            .map(|(i, n)| Document::from([(format!("f{i}"), Value::from(*n))]))
            .collect();
        let merged = conjoin(fragments);
        prop_assert_eq!(merged.len(), values.len());
        prop_assert!(!merged.contains_key(Op::And.as_str()));
    }

    /// A single disjunct is returned unchanged.
    #[test]
    fn disjoin_single_is_identity(fragment in fragment_strategy()) {
        prop_assert_eq!(disjoin(vec![fragment.clone()]), fragment);
    }

    /// Setting an equal value never notifies.
    #[test]
    fn equal_set_never_notifies(value in scalar_strategy()) {
        let mut filter = spec().instance();
        filter.set("A", value.clone()).unwrap();
        let hits = count_changes(&mut filter);
        filter.set("A", value).unwrap();
        prop_assert_eq!(hits.get(), 0);
    }

    /// `clear` is idempotent and notifies at most once.
    #[test]
    fn clear_is_idempotent(a in scalar_strategy(), b in any::<i32>(), set_a in any::<bool>()) {
        let mut filter = spec().instance();
        if set_a {
            filter.set("A", a).unwrap();
        }
        filter.set("B", b).unwrap();
        let hits = count_changes(&mut filter);

        filter.clear().unwrap();
        let first = filter.save();
        filter.clear().unwrap();

        prop_assert!(first.is_empty());
        prop_assert_eq!(filter.save(), first);
        prop_assert_eq!(hits.get(), 1);
    }

    /// `reset` always returns to the construction values.
    #[test]
    fn reset_restores_baseline(
        initial in any::<i32>(),
        later in prop::collection::vec(any::<i32>(), 0..5),
    ) {
        let mut filter = spec()
            .instance_with(serde_json::json!({"B": initial}))
            .unwrap();
        let baseline = filter.save();
        for n in later {
            filter.set("B", n).unwrap();
            filter.set("C", vec![n]).unwrap();
        }
        filter.reset().unwrap();
        prop_assert_eq!(filter.save(), baseline);
    }

    /// Disabling removes a filter from `save`, enabling restores its value.
    #[test]
    fn disable_enable_round_trip(n in any::<i32>()) {
        let mut filter = spec().instance();
        filter.set("B", n).unwrap();
        let before = filter.query().unwrap();

        filter.disable("B").unwrap();
        prop_assert!(filter.save().is_empty());
        prop_assert!(filter.query().unwrap().is_empty());

        filter.enable("B").unwrap();
        prop_assert_eq!(filter.query().unwrap(), before);
    }
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn empty_instance_builds_empty_query() {
    let filter = spec().instance();
    assert!(filter.query().unwrap().is_empty());
    assert!(filter.save().is_empty());
}

#[test]
fn single_element_in_stays_in() {
    let fragment = ops::is_in("c")
        .unwrap()
        .convert(&Value::from(vec![1]))
        .unwrap();
    assert_eq!(
        fragment,
        Value::from(serde_json::json!({"c": {"$in": [1]}}))
    );
}
