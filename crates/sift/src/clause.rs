//! Single-field fragments.
//!
//! A [`Clause`] is one `field / operator / operand` triple. Rendering it gives
//! the fragment shape every field-level factory produces:
//! `{field: {"$op": operand}}`, or `{field: operand}` for equality.

use crate::op::Op;
use crate::value::{Document, Value};

/// A single field predicate.
///
/// # Example
///
/// ```
/// use sift::{Clause, Op, Value};
/// use serde_json::json;
///
/// let fragment = Clause::new("price", Op::Gt, 3).into_fragment();
/// assert_eq!(Value::from(fragment), Value::from(json!({"price": {"$gt": 3}})));
///
/// let fragment = Clause::new("name", Op::Eq, "bob").into_fragment();
/// assert_eq!(Value::from(fragment), Value::from(json!({"name": "bob"})));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The field name to constrain.
    pub field: String,
    /// The operator.
    pub op: Op,
    /// The operand.
    pub value: Value,
}

impl Clause {
    /// Creates a new clause.
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Clause {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Renders the operator document `{"$op": operand}`.
    pub fn operand(&self) -> Document {
        operator(self.op, self.value.clone())
    }

    /// Renders the clause as a one-key fragment.
    ///
    /// Equality uses the implicit form `{field: value}`.
    pub fn into_fragment(self) -> Document {
        let rendered = match self.op {
            Op::Eq => self.value,
            op => Value::Document(operator(op, self.value)),
        };
        Document::from([(self.field, rendered)])
    }
}

/// Builds the one-key document `{"$op": value}`.
pub(crate) fn operator(op: Op, value: impl Into<Value>) -> Document {
    Document::from([(op.as_str().to_string(), value.into())])
}

impl From<Clause> for Value {
    fn from(clause: Clause) -> Self {
        Value::Document(clause.into_fragment())
    }
}
