//! Comparison factories: `eq`, `ne`, the ordering operators and set membership.

use crate::clause::Clause;
use crate::converter::Converter;
use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::value::Value;

use super::{checked_field, required};

/// `{field: value}`. Accepts strings, numbers and null.
pub fn eq(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        match value {
            Value::Number(n) if n.is_nan() => {
                Err(SiftError::validation(&field, value, "NaN is not comparable"))
            }
            Value::String(_) | Value::Number(_) | Value::Null => {
                Ok(Clause::new(field.as_str(), Op::Eq, value.clone()).into())
            }
            other => Err(SiftError::validation(
                &field,
                other,
                "expected a string, number or null",
            )),
        }
    }))
}

/// `{field: {$ne: value}}`. Accepts strings and numbers.
pub fn ne(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        match value {
            Value::Number(n) if n.is_nan() => {
                Err(SiftError::validation(&field, value, "NaN is not comparable"))
            }
            Value::String(_) | Value::Number(_) => {
                Ok(Clause::new(field.as_str(), Op::Ne, value.clone()).into())
            }
            other => Err(SiftError::validation(
                &field,
                other,
                "expected a string or number",
            )),
        }
    }))
}

/// `{field: {$gt: value}}`.
///
/// Dates pass through; anything else is coerced to a number, so `"3"`
/// becomes `3` and `"abc"` is rejected.
pub fn gt(field: impl Into<String>) -> Result<Converter> {
    ordering(field, Op::Gt)
}

/// `{field: {$gte: value}}`. Coerces like [`gt`].
pub fn gte(field: impl Into<String>) -> Result<Converter> {
    ordering(field, Op::Gte)
}

/// `{field: {$lt: value}}`. Coerces like [`gt`].
pub fn lt(field: impl Into<String>) -> Result<Converter> {
    ordering(field, Op::Lt)
}

/// `{field: {$lte: value}}`. Coerces like [`gt`].
pub fn lte(field: impl Into<String>) -> Result<Converter> {
    ordering(field, Op::Lte)
}

fn ordering(field: impl Into<String>, op: Op) -> Result<Converter> {
    debug_assert!(op.is_ordering());
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        let operand = match value {
            Value::Timestamp(ts) => Value::Timestamp(*ts),
            other => match other.to_number() {
                Some(n) => Value::Number(n),
                None => {
                    return Err(SiftError::validation(
                        &field,
                        other,
                        "expected a number or date",
                    ))
                }
            },
        };
        Ok(Clause::new(field.as_str(), op, operand).into())
    }))
}

/// `{field: {$in: values}}`. Requires an array.
///
/// A one-element array is kept as `$in`; it is never rewritten to equality.
pub fn is_in(field: impl Into<String>) -> Result<Converter> {
    membership(field, Op::In)
}

/// `{field: {$nin: values}}`. Requires an array; never rewritten to `$ne`.
pub fn not_in(field: impl Into<String>) -> Result<Converter> {
    membership(field, Op::Nin)
}

fn membership(field: impl Into<String>, op: Op) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        if !value.is_array() {
            return Err(SiftError::validation(&field, value, "expected an array"));
        }
        Ok(Clause::new(field.as_str(), op, value.clone()).into())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::Timestamp;
    use serde_json::json;

    fn convert(conv: &Converter, value: serde_json::Value) -> Result<Value> {
        conv.convert(&Value::from(value))
    }

    #[test]
    fn eq_is_implicit() {
        let conv = eq("name").unwrap();
        assert_eq!(
            convert(&conv, json!("bob")).unwrap(),
            Value::from(json!({"name": "bob"}))
        );
        assert_eq!(
            convert(&conv, json!(null)).unwrap(),
            Value::from(json!({"name": null}))
        );
    }

    #[test]
    fn eq_rejects_structures() {
        let conv = eq("name").unwrap();
        let err = convert(&conv, json!([1])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(convert(&conv, json!({"a": 1})).is_err());
        assert!(convert(&conv, json!(true)).is_err());
    }

    #[test]
    fn eq_and_ne_reject_nan() {
        for conv in [eq("score").unwrap(), ne("score").unwrap()] {
            let err = conv.convert(&Value::from(f64::NAN)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn ne_rejects_null() {
        let conv = ne("status").unwrap();
        assert_eq!(
            convert(&conv, json!(4)).unwrap(),
            Value::from(json!({"status": {"$ne": 4}}))
        );
        assert!(convert(&conv, json!(null)).is_err());
    }

    #[test]
    fn gt_produces_operator() {
        let conv = gt("price").unwrap();
        assert_eq!(
            convert(&conv, json!(3)).unwrap(),
            Value::from(json!({"price": {"$gt": 3}}))
        );
    }

    #[test]
    fn ordering_coerces_strings_and_booleans() {
        let conv = lte("price").unwrap();
        assert_eq!(
            convert(&conv, json!(" 2.5 ")).unwrap(),
            Value::from(json!({"price": {"$lte": 2.5}}))
        );
        assert_eq!(
            convert(&conv, json!(true)).unwrap(),
            Value::from(json!({"price": {"$lte": 1}}))
        );
    }

    #[test]
    fn ordering_rejects_non_numbers() {
        let conv = gt("price").unwrap();
        let err = convert(&conv, json!("abc")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'price': expected a number or date (got \"abc\")"
        );
        assert!(convert(&conv, json!([3])).is_err());
        assert!(conv.convert(&Value::from(f64::NAN)).is_err());
    }

    #[test]
    fn ordering_keeps_dates() {
        let conv = gte("created").unwrap();
        let fragment = conv.convert(&Value::Timestamp(Timestamp(1_000))).unwrap();
        let doc = fragment.into_document().unwrap();
        let operand = doc["created"].as_document().unwrap();
        assert_eq!(operand["$gte"], Value::Timestamp(Timestamp(1_000)));
    }

    #[test]
    fn membership_requires_array() {
        let conv = is_in("tag").unwrap();
        assert_eq!(
            convert(&conv, json!(["a"])).unwrap(),
            Value::from(json!({"tag": {"$in": ["a"]}}))
        );
        assert!(convert(&conv, json!("a")).is_err());

        let conv = not_in("tag").unwrap();
        assert_eq!(
            convert(&conv, json!(["a", "b"])).unwrap(),
            Value::from(json!({"tag": {"$nin": ["a", "b"]}}))
        );
    }

    #[test]
    fn absent_value_rejected() {
        assert!(eq("name").unwrap().call(None).is_err());
        assert!(gt("price").unwrap().call(None).is_err());
        assert!(is_in("tag").unwrap().call(None).is_err());
    }
}
