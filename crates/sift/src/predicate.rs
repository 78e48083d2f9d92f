//! `$where` predicates.
//!
//! A [`WherePredicate`] is a Rust closure evaluated against a whole document,
//! together with the arguments bound when the filter value was converted.
//! Negation wraps the predicate rather than the fragment, because
//! `{"$where": {"$not": ...}}` is not a legal query shape.

use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Predicate function: receives the document being tested and the bound
/// arguments.
pub type PredicateFn = Rc<dyn Fn(&Value, &[Value]) -> bool>;

/// A `$where` predicate with its bound arguments.
///
/// ```
/// use sift::{Value, WherePredicate};
/// use serde_json::json;
///
/// let at_least = WherePredicate::new(|doc, args| {
///     let qty = doc.as_document().and_then(|d| d.get("qty")).and_then(Value::as_number);
///     let min = args.first().and_then(Value::as_number);
///     matches!((qty, min), (Some(q), Some(m)) if q >= m)
/// })
/// .bind(vec![Value::from(5)]);
///
/// assert!(at_least.eval(&Value::from(json!({"qty": 7}))));
/// assert!(!at_least.negate().eval(&Value::from(json!({"qty": 7}))));
/// ```
#[derive(Clone)]
pub struct WherePredicate {
    func: PredicateFn,
    args: Vec<Value>,
    negated: bool,
}

impl WherePredicate {
    /// Wraps a closure with no bound arguments.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> bool + 'static,
    {
        WherePredicate {
            func: Rc::new(f),
            args: Vec::new(),
            negated: false,
        }
    }

    /// Returns a copy with `args` bound in place of any previous arguments.
    pub fn bind(&self, args: Vec<Value>) -> Self {
        WherePredicate {
            func: Rc::clone(&self.func),
            args,
            negated: self.negated,
        }
    }

    /// Returns a predicate that yields the opposite result.
    pub fn negate(&self) -> Self {
        WherePredicate {
            func: Rc::clone(&self.func),
            args: self.args.clone(),
            negated: !self.negated,
        }
    }

    /// Runs the predicate with `document` as its receiver.
    pub fn eval(&self, document: &Value) -> bool {
        (self.func)(document, &self.args) != self.negated
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl PartialEq for WherePredicate {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
            && self.negated == other.negated
            && self.args == other.args
    }
}

impl fmt::Debug for WherePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WherePredicate")
            .field("args", &self.args)
            .field("negated", &self.negated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn has_field() -> WherePredicate {
        WherePredicate::new(|doc, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or_default();
            doc.as_document().is_some_and(|d| d.contains_key(name))
        })
    }

    #[test]
    fn bound_arguments_reach_the_closure() {
        let predicate = has_field().bind(vec![Value::from("a")]);
        assert!(predicate.eval(&Value::from(json!({"a": 1}))));
        assert!(!predicate.eval(&Value::from(json!({"b": 1}))));
    }

    #[test]
    fn double_negation_restores() {
        let predicate = has_field().bind(vec![Value::from("a")]);
        let doc = Value::from(json!({"a": 1}));
        assert!(!predicate.negate().eval(&doc));
        assert!(predicate.negate().negate().eval(&doc));
        assert_eq!(predicate.negate().negate(), predicate);
    }

    #[test]
    fn equality_is_identity_plus_arguments() {
        let base = has_field();
        assert_eq!(base.bind(vec![Value::from(1)]), base.bind(vec![Value::from(1)]));
        assert_ne!(base.bind(vec![Value::from(1)]), base.bind(vec![Value::from(2)]));
        assert_ne!(has_field(), has_field());
    }
}
