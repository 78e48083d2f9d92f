//! Validating converters from filter values to query fragments.
//!
//! A [`Converter`] wraps the function a filter uses to turn its current value
//! into a fragment. Besides the function it carries metadata and lifecycle
//! hooks "attached to the function"; a filter specification merges those
//! with the ones supplied in the filter's config.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::hooks::{Candidate, HookContext, Hooks};
use crate::value::Value;

/// Arbitrary metadata attached to a filter.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Conversion function. `None` means the converter was called without a value.
pub type ConvertFn = Rc<dyn Fn(Option<&Value>) -> Result<Value>>;

/// A validating `value -> fragment` function plus attached metadata and hooks.
///
/// Converters are cheap to clone; clones share the function.
///
/// # Example
///
/// ```
/// use sift::{ops, Value};
/// use serde_json::json;
///
/// let min_price = ops::gte("price").unwrap().meta("label", "Minimum price");
/// let fragment = min_price.convert(&Value::from(3)).unwrap();
///
/// assert_eq!(fragment, Value::from(json!({"price": {"$gte": 3}})));
/// assert_eq!(min_price.metadata()["label"], "Minimum price");
/// ```
#[derive(Clone)]
pub struct Converter {
    func: ConvertFn,
    meta: Meta,
    hooks: Hooks,
}

impl Converter {
    /// Wraps a conversion function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<Value> + 'static,
    {
        Converter {
            func: Rc::new(f),
            meta: Meta::new(),
            hooks: Hooks::new(),
        }
    }

    /// A converter that ignores its argument and always yields `fragment`.
    pub fn constant(fragment: impl Into<Value>) -> Self {
        let fragment = fragment.into();
        Converter::new(move |_| Ok(fragment.clone()))
    }

    /// Converts `value` into a fragment.
    pub fn convert(&self, value: &Value) -> Result<Value> {
        (self.func)(Some(value))
    }

    /// Converts an optional value. Pre-bound converters accept `None`.
    pub fn call(&self, value: Option<&Value>) -> Result<Value> {
        (self.func)(value)
    }

    /// Attaches a metadata entry, replacing any previous value for `key`.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Metadata attached to this converter.
    pub fn metadata(&self) -> &Meta {
        &self.meta
    }

    /// Hooks attached to this converter.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Attaches a `before_set` hook. See [`Hooks::before_set`].
    pub fn before_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &mut Candidate) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_set(f);
        self
    }

    /// Attaches a `before_unset` hook.
    pub fn before_unset<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_unset(f);
        self
    }

    /// Attaches a `before_enable` hook.
    pub fn before_enable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_enable(f);
        self
    }

    /// Attaches a `before_disable` hook.
    pub fn before_disable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_disable(f);
        self
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("meta", &self.meta)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
