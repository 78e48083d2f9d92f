//! Evaluation factories: modulus, regular expressions, text search and
//! `$where` predicates.

use crate::clause::{operator, Clause};
use crate::converter::Converter;
use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::predicate::WherePredicate;
use crate::regex_lit::{compact, from_pattern, RegexLit};
use crate::value::{Document, Number, Value};

use super::{checked_field, required};

/// `{field: {$mod: [divisor, remainder]}}`.
///
/// The value must be a document with integer-coercible `divisor` and
/// `remainder`; a zero divisor is rejected.
pub fn modulo(field: impl Into<String>) -> Result<Converter> {
    let field = checked_field(field)?;
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        let Some(doc) = value.as_document() else {
            return Err(SiftError::validation(
                &field,
                value,
                "expected a document with divisor and remainder",
            ));
        };
        let part = |key: &str| {
            doc.get(key).and_then(Value::to_integer).ok_or_else(|| {
                SiftError::validation(&field, value, format!("{key} must be an integer"))
            })
        };
        let divisor = part("divisor")?;
        let remainder = part("remainder")?;
        if divisor == 0 {
            return Err(SiftError::validation(&field, value, "divisor must not be zero"));
        }
        let operand = vec![Number::I64(divisor), Number::I64(remainder)];
        Ok(Clause::new(field.as_str(), Op::Mod, operand).into())
    }))
}

/// `{field: regex}`, fully bound at factory time.
///
/// `pattern` may be a string, a number (stringified) or a [`RegexLit`]; in
/// the last case its options and `options` are unioned.
///
/// ```
/// use sift::{ops, RegexLit, Value};
///
/// let conv = ops::regex("name", RegexLit::new("^bo", "m").unwrap(), "i").unwrap();
/// let fragment = conv.call(None).unwrap().into_document().unwrap();
/// assert_eq!(fragment["name"], Value::Regex(RegexLit::new("^bo", "im").unwrap()));
/// ```
pub fn regex(
    field: impl Into<String>,
    pattern: impl Into<Value>,
    options: &str,
) -> Result<Converter> {
    let field = checked_field(field)?;
    let regex = from_pattern(&field, &pattern.into(), options)?;
    Ok(Converter::constant(Document::from([(
        field,
        Value::Regex(regex),
    )])))
}

/// `{field: regex}` with the pattern supplied at call time.
///
/// The value may be a string, a number, a [`RegexLit`] or a
/// `{$regex, $options}` document, which is compacted into one regex.
/// `options` are added to whatever options the value carries.
pub fn pattern(field: impl Into<String>, options: &str) -> Result<Converter> {
    let field = checked_field(field)?;
    // Validate the options once, up front.
    RegexLit::new("", options)
        .map_err(|err| SiftError::validation(&field, &Value::from(options), err.to_string()))?;
    let options = options.to_string();
    Ok(Converter::new(move |value| {
        let value = required(&field, value)?;
        let regex = match value {
            Value::Document(doc) => match compact(&field, doc)? {
                Some(regex) => from_pattern(&field, &Value::Regex(regex), &options)?,
                None => {
                    return Err(SiftError::validation(
                        &field,
                        value,
                        "expected a pattern or a $regex document",
                    ))
                }
            },
            other => from_pattern(&field, other, &options)?,
        };
        Ok(Value::Document(Document::from([(
            field.clone(),
            Value::Regex(regex),
        )])))
    }))
}

/// `{$text: {$search: value, $language: language}}`.
///
/// `$language` is omitted when no language is given. Numeric search values
/// are stringified.
pub fn text(language: Option<&str>) -> Converter {
    let language = language.map(str::to_string);
    Converter::new(move |value| {
        let value = required(Op::Text.as_str(), value)?;
        let search = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(SiftError::validation(
                    Op::Text.as_str(),
                    other,
                    "expected a string or number",
                ))
            }
        };
        let mut operand = Document::new();
        operand.insert(Op::Search.as_str().to_string(), Value::String(search));
        if let Some(language) = &language {
            operand.insert(
                Op::Language.as_str().to_string(),
                Value::String(language.clone()),
            );
        }
        Ok(Value::Document(operator(Op::Text, operand)))
    })
}

/// `{$where: predicate}`.
///
/// The converter binds its value as the predicate's arguments: an array
/// spreads into several arguments, no value binds none, anything else binds
/// one. The predicate later runs with the tested document as receiver.
///
/// ```
/// use sift::{ops, Value};
/// use serde_json::json;
///
/// let older = ops::where_fn(|doc, args| {
///     let age = doc.as_document().and_then(|d| d.get("age")).and_then(Value::as_number);
///     matches!((age, args.first().and_then(Value::as_number)), (Some(a), Some(min)) if a > min)
/// });
/// let fragment = older.convert(&Value::from(30)).unwrap().into_document().unwrap();
/// let Value::Where(predicate) = &fragment["$where"] else { panic!() };
/// assert!(predicate.eval(&Value::from(json!({"age": 41}))));
/// assert!(!predicate.eval(&Value::from(json!({"age": 12}))));
/// ```
pub fn where_fn<F>(f: F) -> Converter
where
    F: Fn(&Value, &[Value]) -> bool + 'static,
{
    let predicate = WherePredicate::new(f);
    Converter::new(move |value| {
        let args = match value {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };
        Ok(Value::Document(operator(
            Op::Where,
            Value::Where(predicate.bind(args)),
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn modulo_builds_pair() {
        let conv = modulo("qty").unwrap();
        assert_eq!(
            conv.convert(&Value::from(json!({"divisor": 4, "remainder": "1"})))
                .unwrap(),
            Value::from(json!({"qty": {"$mod": [4, 1]}}))
        );
    }

    #[test]
    fn modulo_truncates_and_validates() {
        let conv = modulo("qty").unwrap();
        assert_eq!(
            conv.convert(&Value::from(json!({"divisor": 4.7, "remainder": 0})))
                .unwrap(),
            Value::from(json!({"qty": {"$mod": [4, 0]}}))
        );
        assert!(conv.convert(&Value::from(json!({"divisor": 4}))).is_err());
        assert!(conv
            .convert(&Value::from(json!({"divisor": 0, "remainder": 0})))
            .is_err());
        assert!(conv.convert(&Value::from(json!([4, 1]))).is_err());
        assert!(conv
            .convert(&Value::from(json!({"divisor": "x", "remainder": 0})))
            .is_err());
    }

    #[test]
    fn regex_compacts_to_literal() {
        let conv = regex("name", "^bob", "i").unwrap();
        let fragment = conv.call(None).unwrap().into_document().unwrap();
        assert_eq!(
            fragment["name"],
            Value::Regex(RegexLit::new("^bob", "i").unwrap())
        );
        assert_eq!(fragment.len(), 1);
    }

    #[test]
    fn regex_numeric_pattern() {
        let conv = regex("code", 42, "").unwrap();
        let fragment = conv.call(None).unwrap().into_document().unwrap();
        assert_eq!(fragment["code"], Value::Regex(RegexLit::new("42", "").unwrap()));
    }

    #[test]
    fn regex_rejects_bad_input_at_factory_time() {
        assert!(regex("name", "(", "").is_err());
        assert!(regex("name", "a", "g").is_err());
        assert!(regex("name", true, "").is_err());
    }

    #[test]
    fn pattern_accepts_strings_and_regex_documents() {
        let conv = pattern("name", "i").unwrap();
        let expected = Value::from(Document::from([(
            "name".to_string(),
            Value::Regex(RegexLit::new("bo", "i").unwrap()),
        )]));
        assert_eq!(conv.convert(&Value::from("bo")).unwrap(), expected);
        assert_eq!(
            conv.convert(&Value::from(json!({"$regex": "bo"}))).unwrap(),
            expected
        );

        let with_options = conv
            .convert(&Value::from(json!({"$regex": "bo", "$options": "m"})))
            .unwrap()
            .into_document()
            .unwrap();
        assert_eq!(
            with_options["name"],
            Value::Regex(RegexLit::new("bo", "im").unwrap())
        );
    }

    #[test]
    fn pattern_rejects_other_documents() {
        let conv = pattern("name", "").unwrap();
        assert!(conv.convert(&Value::from(json!({"$gt": 1}))).is_err());
        assert!(conv.convert(&Value::from("(")).is_err());
        assert!(pattern("name", "q").is_err());
    }

    #[test]
    fn text_with_and_without_language() {
        assert_eq!(
            text(None).convert(&Value::from("coffee")).unwrap(),
            Value::from(json!({"$text": {"$search": "coffee"}}))
        );
        assert_eq!(
            text(Some("es")).convert(&Value::from(42)).unwrap(),
            Value::from(json!({"$text": {"$search": "42", "$language": "es"}}))
        );
        assert!(text(None).convert(&Value::from(json!([1]))).is_err());
    }

    #[test]
    fn where_binds_arguments() {
        let conv = where_fn(|_, args| args.len() == 2);
        let spread = conv
            .convert(&Value::from(json!([1, 2])))
            .unwrap()
            .into_document()
            .unwrap();
        let Value::Where(predicate) = &spread["$where"] else {
            panic!("expected a predicate");
        };
        assert_eq!(predicate.args(), &[Value::from(1), Value::from(2)]);
        assert!(predicate.eval(&Value::Null));

        let none = conv.call(None).unwrap().into_document().unwrap();
        let Value::Where(predicate) = &none["$where"] else {
            panic!("expected a predicate");
        };
        assert!(predicate.args().is_empty());
    }
}
