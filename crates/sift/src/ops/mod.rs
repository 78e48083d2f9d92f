//! The query-fragment library.
//!
//! Every factory is a two-stage constructor: the factory binds a field name
//! (and any options) and returns a [`Converter`](crate::Converter); calling
//! the converter with a value validates it and produces a fragment.
//!
//! ```
//! use sift::{ops, Value};
//! use serde_json::json;
//!
//! let cheap = ops::lt("price").unwrap();
//! assert_eq!(
//!     cheap.convert(&Value::from("10")).unwrap(),
//!     Value::from(json!({"price": {"$lt": 10}}))
//! );
//! assert!(cheap.convert(&Value::from("ten")).is_err());
//! ```
//!
//! | Family | Factories |
//! |--------|-----------|
//! | Comparison | [`eq`], [`ne`], [`gt`], [`gte`], [`lt`], [`lte`], [`is_in`], [`not_in`] |
//! | Logical | [`and`], [`or`], [`nor`], [`not`] |
//! | Element | [`exists`], [`type_of`] |
//! | Evaluation | [`modulo`], [`regex`], [`pattern`], [`text`], [`where_fn`] |
//! | Array | [`all`], [`elem_match`], [`size`] |

mod array;
mod comparison;
mod element;
mod evaluation;
mod logical;

pub use array::{all, elem_match, size};
pub use comparison::{eq, gt, gte, is_in, lt, lte, ne, not_in};
pub use element::{exists, type_of};
pub use evaluation::{modulo, pattern, regex, text, where_fn};
pub use logical::{and, nor, not, or, Branches};

use crate::error::{Result, SiftError};
use crate::value::Value;

/// Rejects empty field names at factory time.
pub(crate) fn checked_field(field: impl Into<String>) -> Result<String> {
    let field = field.into();
    if field.is_empty() {
        return Err(SiftError::validation(
            "field",
            &Value::from(""),
            "field name must not be empty",
        ));
    }
    Ok(field)
}

/// Unwraps the converter argument, failing when it was not supplied.
pub(crate) fn required<'a>(field: &str, value: Option<&'a Value>) -> Result<&'a Value> {
    value.ok_or_else(|| SiftError::missing_value(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_rejected() {
        assert!(checked_field("").is_err());
        assert_eq!(checked_field("price").unwrap(), "price");
    }

    #[test]
    fn empty_field_rejected_by_factories() {
        assert!(eq("").is_err());
        assert!(size("").is_err());
        assert!(pattern("", "").is_err());
    }

    #[test]
    fn missing_value_names_field() {
        let err = required("price", None).unwrap_err();
        assert!(err.to_string().contains("'price'"));
        assert!(required("price", Some(&Value::Null)).is_ok());
    }
}
