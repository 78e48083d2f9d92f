//! Element factories: `exists` and `type_of`.

use crate::clause::Clause;
use crate::converter::Converter;
use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::value::Value;

use super::checked_field;

/// `{field: {$exists: bool}}`.
///
/// The value is reduced to its truthiness; calling without a value means
/// `true`.
pub fn exists(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let present = value.map_or(true, Value::is_truthy);
        Ok(Clause::new(field.as_str(), Op::Exists, present).into())
    }))
}

/// `{field: {$type: code}}`, fully bound at factory time.
///
/// The code must be a number; the converter ignores its argument.
pub fn type_of(field: impl Into<String>, code: impl Into<Value>) -> Result<Converter> {
    let field = checked_field(field)?;
    let code = code.into();
    match code {
        Value::Number(n) if !n.is_nan() => {
            Ok(Converter::constant(Clause::new(field, Op::Type, n)))
        }
        other => Err(SiftError::validation(
            &field,
            &other,
            "type code must be a number",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exists_defaults_to_true() {
        let conv = exists("email").unwrap();
        assert_eq!(
            conv.call(None).unwrap(),
            Value::from(json!({"email": {"$exists": true}}))
        );
    }

    #[test]
    fn exists_coerces_to_boolean() {
        let conv = exists("email").unwrap();
        assert_eq!(
            conv.convert(&Value::from(0)).unwrap(),
            Value::from(json!({"email": {"$exists": false}}))
        );
        assert_eq!(
            conv.convert(&Value::from("yes")).unwrap(),
            Value::from(json!({"email": {"$exists": true}}))
        );
        assert_eq!(
            conv.convert(&Value::Null).unwrap(),
            Value::from(json!({"email": {"$exists": false}}))
        );
    }

    #[test]
    fn type_of_is_prebound() {
        let conv = type_of("age", 16).unwrap();
        let expected = Value::from(json!({"age": {"$type": 16}}));
        assert_eq!(conv.call(None).unwrap(), expected);
        assert_eq!(conv.convert(&Value::from("ignored")).unwrap(), expected);
    }

    #[test]
    fn type_of_rejects_bad_codes() {
        assert!(type_of("age", "int").is_err());
        assert!(type_of("age", f64::NAN).is_err());
    }
}
