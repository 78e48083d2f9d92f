//! Fragment minimization.
//!
//! [`conjoin`] is the merge used by `and` and by a filter instance's final
//! query; [`disjoin`] is the one used by `or`.

use crate::op::Op;
use crate::value::{Document, Value};

/// Merges fragments into one conjunctive document.
///
/// Fragments whose keys are all new are flattened into the result. A
/// fragment sharing any key with what is already merged is kept whole in an
/// `$and` list, so no constraint is dropped. The overflow keeps input order
/// and is appended to an existing `$and` array if the merged fragments
/// already brought one.
///
/// ```
/// use sift::{conjoin, Value};
/// use serde_json::json;
///
/// let fragments = [json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})]
///     .into_iter()
///     .filter_map(|f| Value::from(f).into_document());
///
/// assert_eq!(
///     Value::from(conjoin(fragments)),
///     Value::from(json!({"a": 1, "b": 2, "$and": [{"a": 3, "c": 4}]}))
/// );
/// ```
pub fn conjoin<I>(fragments: I) -> Document
where
    I: IntoIterator<Item = Document>,
{
    let mut merged = Document::new();
    let mut overflow = Vec::new();

    for fragment in fragments {
        if fragment.keys().any(|key| merged.contains_key(key)) {
            overflow.push(Value::Document(fragment));
        } else {
            merged.extend(fragment);
        }
    }

    if overflow.is_empty() {
        return merged;
    }

    let and = Op::And.as_str();
    match merged.get_mut(and) {
        Some(Value::Array(items)) => items.extend(overflow),
        Some(other) => {
            // A non-list `$and` is kept as its own conjunct.
            let existing = std::mem::take(other);
            let first = Document::from([(and.to_string(), existing)]);
            overflow.insert(0, Value::Document(first));
            *other = Value::Array(overflow);
        }
        None => {
            merged.insert(and.to_string(), Value::Array(overflow));
        }
    }
    merged
}

/// Builds a disjunction, unwrapping trivial cases.
///
/// No fragments yield `{}`, a single fragment is returned as-is, and several
/// become `{$or: [...]}` in input order.
pub fn disjoin<I>(fragments: I) -> Document
where
    I: IntoIterator<Item = Document>,
{
    let mut fragments: Vec<Document> = fragments.into_iter().collect();
    match fragments.len() {
        0 => Document::new(),
        1 => fragments.pop().unwrap_or_default(),
        _ => Document::from([(
            Op::Or.as_str().to_string(),
            Value::Array(fragments.into_iter().map(Value::Document).collect()),
        )]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<serde_json::Value>) -> Vec<Document> {
        values
            .into_iter()
            .filter_map(|v| Value::from(v).into_document())
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(conjoin(Vec::<Document>::new()).is_empty());
        assert!(disjoin(Vec::<Document>::new()).is_empty());
    }

    #[test]
    fn distinct_keys_flatten() {
        let merged = conjoin(docs(vec![json!({"a": 1}), json!({"b": {"$gt": 2}})]));
        assert_eq!(
            Value::from(merged),
            Value::from(json!({"a": 1, "b": {"$gt": 2}}))
        );
    }

    #[test]
    fn colliding_fragment_moves_whole() {
        let merged = conjoin(docs(vec![json!({"a": 1}), json!({"a": 2, "b": 3})]));
        // `b` is not flattened: the whole second fragment overflows
        assert_eq!(
            Value::from(merged),
            Value::from(json!({"a": 1, "$and": [{"a": 2, "b": 3}]}))
        );
    }

    #[test]
    fn overflow_keeps_order() {
        let merged = conjoin(docs(vec![
            json!({"a": 1}),
            json!({"a": 2}),
            json!({"a": 3}),
        ]));
        assert_eq!(
            Value::from(merged),
            Value::from(json!({"a": 1, "$and": [{"a": 2}, {"a": 3}]}))
        );
    }

    #[test]
    fn overflow_extends_existing_and() {
        let merged = conjoin(docs(vec![
            json!({"$and": [{"x": 1}]}),
            json!({"b": 1}),
            json!({"b": 2}),
        ]));
        assert_eq!(
            Value::from(merged),
            Value::from(json!({"$and": [{"x": 1}, {"b": 2}], "b": 1}))
        );
    }

    #[test]
    fn disjoin_unwraps_single() {
        let single = disjoin(docs(vec![json!({"a": 1, "b": 2})]));
        assert_eq!(Value::from(single), Value::from(json!({"a": 1, "b": 2})));

        let many = disjoin(docs(vec![json!({"a": 1}), json!({"a": 2})]));
        assert_eq!(
            Value::from(many),
            Value::from(json!({"$or": [{"a": 1}, {"a": 2}]}))
        );
    }
}
