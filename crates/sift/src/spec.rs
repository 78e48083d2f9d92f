//! Filter specifications.
//!
//! A [`FilterSpec`] is the reusable declaration of the filters one kind of
//! listing offers: an ordered set of named [`FilterDescriptor`]s plus an
//! optional type tag. It is built once from a [`SpecInput`] and then used to
//! create any number of [`FilterInstance`]s.
//!
//! # Construction
//!
//! Input comes in several shapes, all normalized into a `SpecInput`:
//!
//! ```rust
//! use sift::{ops, FilterConfig, FilterSpec, SpecInput};
//! use indexmap::IndexMap;
//!
//! // An array or vector of pairs: declaration order is kept
//! let spec = FilterSpec::create([
//!     ("MinPrice", ops::gte("price").unwrap()),
//!     ("MaxPrice", ops::lte("price").unwrap()),
//! ])
//! .unwrap();
//! assert_eq!(spec.names(), vec!["MinPrice", "MaxPrice"]);
//!
//! // A sequence of single-entry maps, flattened in encounter order,
//! // wrapped with a type tag
//! let mut first = IndexMap::new();
//! first.insert("Name".to_string(), FilterConfig::new(ops::eq("name").unwrap()));
//! let mut second = IndexMap::new();
//! second.insert("Tag".to_string(), FilterConfig::new(ops::is_in("tags").unwrap()));
//!
//! let spec = FilterSpec::create(SpecInput::from(vec![first, second]).with_type("products"))
//!     .unwrap();
//! assert_eq!(spec.type_tag(), Some("products"));
//! assert_eq!(spec.names(), vec!["Name", "Tag"]);
//! ```
//!
//! # Metadata and hooks
//!
//! Both can be attached to the converter and to the filter's config. Metadata
//! is shallow-merged with the config winning on key collisions; the merged
//! map is computed at build time and refreshed by [`FilterSpec::set_meta`].
//! Hooks are concatenated, converter hooks first.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::converter::{Converter, Meta};
use crate::error::{Result, SiftError};
use crate::hooks::{Candidate, HookContext, Hooks};
use crate::instance::FilterInstance;
use crate::value::Value;

/// A converter together with filter-level metadata and hooks.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    filter: Converter,
    meta: Meta,
    hooks: Hooks,
}

impl FilterConfig {
    pub fn new(filter: Converter) -> Self {
        FilterConfig {
            filter,
            meta: Meta::new(),
            hooks: Hooks::new(),
        }
    }

    /// Adds a config-level metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Adds a config-level `before_set` hook.
    pub fn before_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &mut Candidate) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_set(f);
        self
    }

    /// Adds a config-level `before_unset` hook.
    pub fn before_unset<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_unset(f);
        self
    }

    /// Adds a config-level `before_enable` hook.
    pub fn before_enable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_enable(f);
        self
    }

    /// Adds a config-level `before_disable` hook.
    pub fn before_disable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.hooks = self.hooks.before_disable(f);
        self
    }
}

/// One filter in a [`SpecInput`]: a bare converter or a full config.
#[derive(Debug, Clone)]
pub enum FilterEntry {
    Converter(Converter),
    Config(FilterConfig),
}

impl FilterEntry {
    fn into_config(self) -> FilterConfig {
        match self {
            FilterEntry::Converter(filter) => FilterConfig::new(filter),
            FilterEntry::Config(config) => config,
        }
    }
}

impl From<Converter> for FilterEntry {
    fn from(converter: Converter) -> Self {
        FilterEntry::Converter(converter)
    }
}

impl From<FilterConfig> for FilterEntry {
    fn from(config: FilterConfig) -> Self {
        FilterEntry::Config(config)
    }
}

/// Normalized input for [`FilterSpec::create`].
#[derive(Debug, Clone, Default)]
pub struct SpecInput {
    type_tag: Option<String>,
    entries: Vec<(String, FilterEntry)>,
}

impl SpecInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn filter(mut self, name: impl Into<String>, entry: impl Into<FilterEntry>) -> Self {
        self.entries.push((name.into(), entry.into()));
        self
    }

    /// Sets the opaque type tag of the specification.
    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, E> From<Vec<(S, E)>> for SpecInput
where
    S: Into<String>,
    E: Into<FilterEntry>,
{
    fn from(entries: Vec<(S, E)>) -> Self {
        SpecInput {
            type_tag: None,
            entries: entries
                .into_iter()
                .map(|(name, entry)| (name.into(), entry.into()))
                .collect(),
        }
    }
}

impl<S, E, const N: usize> From<[(S, E); N]> for SpecInput
where
    S: Into<String>,
    E: Into<FilterEntry>,
{
    fn from(entries: [(S, E); N]) -> Self {
        SpecInput::from(Vec::from(entries))
    }
}

impl<E: Into<FilterEntry>> From<IndexMap<String, E>> for SpecInput {
    fn from(entries: IndexMap<String, E>) -> Self {
        SpecInput::from(entries.into_iter().collect::<Vec<_>>())
    }
}

/// A sequence of single-entry maps, flattened in encounter order.
impl<E: Into<FilterEntry>> From<Vec<IndexMap<String, E>>> for SpecInput {
    fn from(maps: Vec<IndexMap<String, E>>) -> Self {
        SpecInput::from(maps.into_iter().flatten().collect::<Vec<_>>())
    }
}

/// A named filter as resolved by the specification.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    name: String,
    converter: Converter,
    hooks: Hooks,
}

impl FilterDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Converter hooks followed by config hooks.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

struct MetaEntry {
    config: Meta,
    merged: Meta,
}

fn merge_meta(from_converter: &Meta, from_config: &Meta) -> Meta {
    let mut merged = from_converter.clone();
    for (key, value) in from_config {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

struct SpecInner {
    type_tag: Option<String>,
    filters: IndexMap<String, FilterDescriptor>,
    meta: RefCell<IndexMap<String, MetaEntry>>,
}

/// A reusable filter specification.
///
/// Cloning is cheap and yields a handle to the same specification, so
/// metadata updates are seen by every instance built from it.
///
/// ```
/// use sift::{ops, FilterSpec, Value};
/// use serde_json::json;
///
/// let spec = FilterSpec::create([("MinPrice", ops::gte("price").unwrap())]).unwrap();
/// let filter = spec.instance_with(json!({"MinPrice": 3})).unwrap();
///
/// assert_eq!(Value::from(filter.query().unwrap()), Value::from(json!({"price": {"$gte": 3}})));
/// assert_eq!(Value::from(filter.save()), Value::from(json!({"MinPrice": 3})));
/// ```
#[derive(Clone)]
pub struct FilterSpec {
    inner: Rc<SpecInner>,
}

impl FilterSpec {
    /// Builds a specification.
    ///
    /// Fails with a configuration error when no filters are given, when a
    /// name is empty, or when a name appears twice.
    pub fn create(input: impl Into<SpecInput>) -> Result<Self> {
        let input = input.into();
        if input.is_empty() {
            return Err(SiftError::invalid_spec("no filters supplied"));
        }

        let mut filters = IndexMap::with_capacity(input.len());
        let mut meta = IndexMap::with_capacity(input.len());
        for (name, entry) in input.entries {
            if name.is_empty() {
                return Err(SiftError::invalid_spec("filter names must not be empty"));
            }
            if filters.contains_key(&name) {
                return Err(SiftError::DuplicateFilter { name });
            }
            let config = entry.into_config();
            let hooks = config.filter.hooks().then(&config.hooks);
            let merged = merge_meta(config.filter.metadata(), &config.meta);
            meta.insert(
                name.clone(),
                MetaEntry {
                    config: config.meta,
                    merged,
                },
            );
            filters.insert(
                name.clone(),
                FilterDescriptor {
                    name,
                    converter: config.filter,
                    hooks,
                },
            );
        }

        debug!(
            filters = filters.len(),
            type_tag = ?input.type_tag,
            "filter specification created"
        );
        Ok(FilterSpec {
            inner: Rc::new(SpecInner {
                type_tag: input.type_tag,
                filters,
                meta: RefCell::new(meta),
            }),
        })
    }

    /// Filter names in canonical order. The vector is a copy.
    pub fn names(&self) -> Vec<String> {
        self.inner.filters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.filters.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.filters.contains_key(name)
    }

    /// The opaque type tag, or `None` when the specification has none.
    pub fn type_tag(&self) -> Option<&str> {
        self.inner.type_tag.as_deref()
    }

    /// Looks up a filter by name.
    pub fn descriptor(&self, name: &str) -> Result<&FilterDescriptor> {
        self.inner
            .filters
            .get(name)
            .ok_or_else(|| SiftError::unknown_filter(name))
    }

    /// Descriptors in canonical order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.inner.filters.values()
    }

    /// Merged metadata of one filter.
    pub fn meta(&self, name: &str) -> Result<Meta> {
        self.inner
            .meta
            .borrow()
            .get(name)
            .map(|entry| entry.merged.clone())
            .ok_or_else(|| SiftError::unknown_filter(name))
    }

    /// Merged metadata of every filter, in canonical order.
    pub fn meta_all(&self) -> IndexMap<String, Meta> {
        self.inner
            .meta
            .borrow()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.merged.clone()))
            .collect()
    }

    /// Shallow-merges `meta` into a filter's config-level metadata.
    pub fn set_meta(&self, name: &str, meta: Meta) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        let mut table = self.inner.meta.borrow_mut();
        let entry = table
            .get_mut(name)
            .ok_or_else(|| SiftError::unknown_filter(name))?;
        for (key, value) in meta {
            entry.config.insert(key, value);
        }
        entry.merged = merge_meta(descriptor.converter.metadata(), &entry.config);
        debug!(filter = name, "filter metadata updated");
        Ok(())
    }

    /// Applies [`set_meta`](Self::set_meta) for each entry.
    ///
    /// Every name is checked before anything is merged.
    pub fn set_meta_many<I, S>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Meta)>,
        S: AsRef<str>,
    {
        let entries: Vec<(S, Meta)> = entries.into_iter().collect();
        for (name, _) in &entries {
            self.descriptor(name.as_ref())?;
        }
        for (name, meta) in entries {
            self.set_meta(name.as_ref(), meta)?;
        }
        Ok(())
    }

    /// Creates an instance with no filter set.
    pub fn instance(&self) -> FilterInstance {
        FilterInstance::new(self.clone())
    }

    /// Creates an instance and sets `values` (a document of name to value).
    ///
    /// The values become the instance's reset baseline. Any failure is
    /// reported as a construction error wrapping its cause.
    pub fn instance_with(&self, values: impl Into<Value>) -> Result<FilterInstance> {
        FilterInstance::with_values(self.clone(), values.into())
    }

    /// Returns `true` if both handles point at the same specification.
    pub fn ptr_eq(&self, other: &FilterSpec) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSpec")
            .field("type_tag", &self.inner.type_tag)
            .field("names", &self.names())
            .finish()
    }
}
