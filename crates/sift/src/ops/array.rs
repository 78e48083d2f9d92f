//! Array factories: `all`, `elem_match` and `size`.

use crate::clause::Clause;
use crate::converter::Converter;
use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::value::Value;

use super::{checked_field, required};

/// `{field: {$all: values}}`. Requires an array.
pub fn all(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        if !value.is_array() {
            return Err(SiftError::validation(&field, value, "expected an array"));
        }
        Ok(Clause::new(field.as_str(), Op::All, value.clone()).into())
    }))
}

/// `{field: {$elemMatch: query}}`. Requires a document.
pub fn elem_match(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        if !value.is_document() {
            return Err(SiftError::validation(&field, value, "expected a document"));
        }
        Ok(Clause::new(field.as_str(), Op::ElemMatch, value.clone()).into())
    }))
}

/// `{field: {$size: n}}`. Requires a non-negative integer-coercible number.
pub fn size(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        match value.to_integer() {
            Some(n) if n >= 0 => Ok(Clause::new(field.as_str(), Op::Size, n).into()),
            _ => Err(SiftError::validation(
                &field,
                value,
                "expected a non-negative integer",
            )),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_requires_array() {
        let conv = all("tags").unwrap();
        assert_eq!(
            conv.convert(&Value::from(json!(["a", "b"]))).unwrap(),
            Value::from(json!({"tags": {"$all": ["a", "b"]}}))
        );
        assert!(conv.convert(&Value::from("a")).is_err());
    }

    #[test]
    fn elem_match_requires_document() {
        let conv = elem_match("items").unwrap();
        assert_eq!(
            conv.convert(&Value::from(json!({"qty": {"$gt": 2}}))).unwrap(),
            Value::from(json!({"items": {"$elemMatch": {"qty": {"$gt": 2}}}}))
        );
        assert!(conv.convert(&Value::from(json!([1]))).is_err());
    }

    #[test]
    fn size_coerces_to_integer() {
        let conv = size("tags").unwrap();
        assert_eq!(
            conv.convert(&Value::from("3")).unwrap(),
            Value::from(json!({"tags": {"$size": 3}}))
        );
        assert_eq!(
            conv.convert(&Value::from(2.9)).unwrap(),
            Value::from(json!({"tags": {"$size": 2}}))
        );
        assert!(conv.convert(&Value::from(-1)).is_err());
        assert!(conv.convert(&Value::from("many")).is_err());
    }
}
