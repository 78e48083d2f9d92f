//! Boolean combinators and negation.

use indexmap::IndexMap;

use crate::converter::Converter;
use crate::error::{Result, SiftError};
use crate::merge::{conjoin, disjoin};
use crate::negate::negate;
use crate::op::Op;
use crate::value::{Document, Value};

/// The branches of an `and`, `or` or `nor`.
///
/// Either fragments that are already built, or named sub-converters that
/// receive the value stored under their name in the combinator's values
/// document.
#[derive(Debug, Clone)]
pub enum Branches {
    /// Pre-built fragments, used as-is.
    Fragments(Vec<Value>),
    /// Sub-converters keyed by name, in evaluation order.
    Named(Vec<(String, Converter)>),
}

impl Branches {
    fn is_empty(&self) -> bool {
        match self {
            Branches::Fragments(fragments) => fragments.is_empty(),
            Branches::Named(named) => named.is_empty(),
        }
    }

    /// Evaluates every branch, in order.
    fn fragments(&self, op: Op, values: Option<&Value>) -> Result<Vec<Document>> {
        match self {
            Branches::Fragments(fragments) => fragments
                .iter()
                .map(|fragment| as_fragment(op.as_str(), fragment.clone()))
                .collect(),
            Branches::Named(named) => {
                let values = match values {
                    None | Some(Value::Null) => None,
                    Some(Value::Document(doc)) => Some(doc),
                    Some(other) => {
                        return Err(SiftError::validation(
                            op.as_str(),
                            other,
                            "expected a document of branch values",
                        ))
                    }
                };
                named
                    .iter()
                    .map(|(name, converter)| {
                        let value = values.and_then(|doc| doc.get(name));
                        as_fragment(name, converter.call(value)?)
                    })
                    .collect()
            }
        }
    }
}

fn as_fragment(name: &str, value: Value) -> Result<Document> {
    match value {
        Value::Document(doc) => Ok(doc),
        other => Err(SiftError::validation(
            name,
            &other,
            "a branch must be a query fragment",
        )),
    }
}

impl From<Vec<Value>> for Branches {
    fn from(fragments: Vec<Value>) -> Self {
        Branches::Fragments(fragments)
    }
}

impl From<Vec<Document>> for Branches {
    fn from(fragments: Vec<Document>) -> Self {
        Branches::Fragments(fragments.into_iter().map(Value::Document).collect())
    }
}

impl<S: Into<String>> From<Vec<(S, Converter)>> for Branches {
    fn from(named: Vec<(S, Converter)>) -> Self {
        Branches::Named(
            named
                .into_iter()
                .map(|(name, converter)| (name.into(), converter))
                .collect(),
        )
    }
}

impl<S: Into<String>, const N: usize> From<[(S, Converter); N]> for Branches {
    fn from(named: [(S, Converter); N]) -> Self {
        Branches::from(Vec::from(named))
    }
}

impl From<IndexMap<String, Converter>> for Branches {
    fn from(named: IndexMap<String, Converter>) -> Self {
        Branches::Named(named.into_iter().collect())
    }
}

/// Conjunction of the branches, merge-minimized.
///
/// Fragments constraining distinct keys are flattened into one document;
/// a fragment that collides with an earlier key is kept whole under `$and`.
///
/// ```
/// use sift::{ops, Value};
/// use serde_json::json;
///
/// let both = ops::and([
///     ("a", ops::eq("f1").unwrap()),
///     ("b", ops::eq("f1").unwrap()),
/// ])
/// .unwrap();
///
/// let fragment = both.convert(&Value::from(json!({"a": 1, "b": 2}))).unwrap();
/// assert_eq!(fragment, Value::from(json!({"f1": 1, "$and": [{"f1": 2}]})));
/// ```
pub fn and(branches: impl Into<Branches>) -> Result<Converter> {
    let branches = branches.into();
    Ok(Converter::new(move |values| {
        Ok(Value::Document(conjoin(branches.fragments(Op::And, values)?)))
    }))
}

/// Disjunction of the branches. A single branch is unwrapped; no branches
/// yield the empty query.
pub fn or(branches: impl Into<Branches>) -> Result<Converter> {
    let branches = branches.into();
    Ok(Converter::new(move |values| {
        Ok(Value::Document(disjoin(branches.fragments(Op::Or, values)?)))
    }))
}

/// `{$nor: [fragment, ...]}`, without minimization. Requires at least one
/// branch.
pub fn nor(branches: impl Into<Branches>) -> Result<Converter> {
    let branches = branches.into();
    if branches.is_empty() {
        return Err(SiftError::validation(
            Op::Nor.as_str(),
            &Value::Array(Vec::new()),
            "at least one branch is required",
        ));
    }
    Ok(Converter::new(move |values| {
        let fragments = branches.fragments(Op::Nor, values)?;
        let list = fragments.into_iter().map(Value::Document).collect();
        Ok(Value::Document(Document::from([(
            Op::Nor.as_str().to_string(),
            Value::Array(list),
        )])))
    }))
}

/// Negates what `converter` produces.
///
/// The fragment is restructured per shape, since the query language does
/// not accept `$not` everywhere. See the crate docs for the rules.
pub fn not(converter: Converter) -> Converter {
    Converter::new(move |value| negate(converter.call(value)?))
}
