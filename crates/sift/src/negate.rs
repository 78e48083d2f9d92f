//! Negation of query fragments.
//!
//! `$not` is only legal in a few positions, so negating a fragment means
//! restructuring it according to its shape:
//!
//! | Fragment | Negation |
//! |----------|----------|
//! | `{$where: p}` | `{$where: !p}` |
//! | `{f: /re/}` | `{f: {$not: /re/}}` |
//! | `{f: {$regex, $options}}` | `{f: {$not: /re/opts}}` |
//! | `{f: {$op: v, ...}}` | `{f: {$not: {$op: v, ...}}}` |
//! | `{f: v}` | `{f: {$not: {$eq: v}}}` |
//! | anything else | `{$nor: [fragment]}` |

use crate::clause::operator;
use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::regex_lit::compact;
use crate::value::{Document, Value};

/// Returns the negation of `fragment`.
pub(crate) fn negate(fragment: Value) -> Result<Value> {
    let doc = match fragment {
        Value::Document(doc) => doc,
        other => {
            return Err(SiftError::validation(
                Op::Not.as_str(),
                &other,
                "can only negate a query fragment",
            ))
        }
    };

    // Replaces per-key negation: `not (a and b)` is not `not a and not b`,
    // so several keys negate as a whole through `$nor`.
    if doc.len() != 1 {
        return Ok(nor(doc));
    }
    let Some((key, value)) = doc.first().map(|(k, v)| (k.clone(), v.clone())) else {
        return Ok(nor(doc));
    };

    if key == Op::Where.as_str() {
        return match value {
            Value::Where(predicate) => Ok(Value::Document(operator(
                Op::Where,
                Value::Where(predicate.negate()),
            ))),
            other => Err(SiftError::validation(
                &key,
                &other,
                "expected a where predicate",
            )),
        };
    }
    // `$not` cannot wrap a top-level operator.
    if Op::is_operator_key(&key) {
        return Ok(nor(doc));
    }

    let negated = match value {
        Value::Regex(regex) => Value::Regex(regex),
        Value::Document(inner) => match compact(&key, &inner)? {
            Some(regex) => Value::Regex(regex),
            // Wrapped whole rather than as `{$eq: doc}`, so `not(gt)` means
            // "not greater than".
            None if is_operator_document(&inner) => Value::Document(inner),
            None => Value::Document(operator(Op::Eq, Value::Document(inner))),
        },
        other => Value::Document(operator(Op::Eq, other)),
    };
    Ok(Value::Document(Document::from([(
        key,
        Value::Document(operator(Op::Not, negated)),
    )])))
}

fn is_operator_document(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|key| Op::is_operator_key(key))
}

fn nor(doc: Document) -> Value {
    Value::Document(operator(Op::Nor, vec![Value::Document(doc)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::WherePredicate;
    use crate::regex_lit::RegexLit;
    use serde_json::json;

    fn negated(fragment: serde_json::Value) -> Value {
        negate(Value::from(fragment)).unwrap()
    }

    fn not_of(field: &str, inner: Value) -> Value {
        Value::Document(Document::from([(
            field.to_string(),
            Value::Document(operator(Op::Not, inner)),
        )]))
    }

    #[test]
    fn scalar_wrapped_in_eq() {
        assert_eq!(
            negated(json!({"price": 5})),
            Value::from(json!({"price": {"$not": {"$eq": 5}}}))
        );
        assert_eq!(
            negated(json!({"name": null})),
            Value::from(json!({"name": {"$not": {"$eq": null}}}))
        );
    }

    #[test]
    fn regex_left_untouched() {
        let regex = RegexLit::new("x", "i").unwrap();
        let fragment = Value::Document(Document::from([(
            "name".to_string(),
            Value::Regex(regex.clone()),
        )]));
        assert_eq!(
            negate(fragment).unwrap(),
            not_of("name", Value::Regex(regex))
        );
    }

    #[test]
    fn regex_document_compacted() {
        assert_eq!(
            negated(json!({"name": {"$regex": "x", "$options": "i"}})),
            not_of("name", Value::Regex(RegexLit::new("x", "i").unwrap()))
        );
    }

    #[test]
    fn operator_document_wrapped() {
        assert_eq!(
            negated(json!({"price": {"$gt": 3}})),
            Value::from(json!({"price": {"$not": {"$gt": 3}}}))
        );
    }

    #[test]
    fn plain_document_compared_for_equality() {
        assert_eq!(
            negated(json!({"address": {"city": "Oslo"}})),
            Value::from(json!({"address": {"$not": {"$eq": {"city": "Oslo"}}}}))
        );
    }

    #[test]
    fn conjunctions_use_nor() {
        assert_eq!(
            negated(json!({"a": 1, "b": 2})),
            Value::from(json!({"$nor": [{"a": 1, "b": 2}]}))
        );
        assert_eq!(
            negated(json!({"$or": [{"a": 1}, {"b": 2}]})),
            Value::from(json!({"$nor": [{"$or": [{"a": 1}, {"b": 2}]}]}))
        );
    }

    #[test]
    fn where_predicate_inverted() {
        let predicate = WherePredicate::new(|_, _| true);
        let fragment = Value::Document(operator(Op::Where, predicate.clone()));
        let result = negate(fragment).unwrap().into_document().unwrap();
        assert_eq!(result["$where"], Value::Where(predicate.negate()));
    }

    #[test]
    fn non_fragments_rejected() {
        assert!(negate(Value::from(3)).is_err());
        assert!(negate(Value::from(json!({"$where": 1}))).is_err());
    }
}
