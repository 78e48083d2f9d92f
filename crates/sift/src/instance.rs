//! Filter instances: the per-listing state container.
//!
//! A [`FilterInstance`] holds the values currently chosen for the filters of
//! one [`FilterSpec`]. Each filter is in one of three states:
//!
//! ```text
//!            set                 disable
//!   Unset ─────────▶ Enabled ◀──────────▶ Disabled
//!     ▲                 │        enable       │
//!     └──── unset ──────┴─────────────────────┘
//! ```
//!
//! Only enabled filters take part in [`save`](FilterInstance::save) and
//! [`query`](FilterInstance::query). Disabling keeps the value so that
//! enabling restores it without a new `set`.
//!
//! # Notifications
//!
//! Every public mutation runs as one batch: listeners fire at most once per
//! call, after it completes, and only if the state really changed. Mutations
//! performed by hooks during the call join the same batch.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use sift::{ops, FilterSpec};
//! use serde_json::json;
//!
//! let spec = FilterSpec::create([
//!     ("MinPrice", ops::gte("price").unwrap()),
//!     ("Name", ops::eq("name").unwrap()),
//! ])
//! .unwrap();
//! let mut filter = spec.instance();
//!
//! let changes = Rc::new(Cell::new(0));
//! let counter = changes.clone();
//! filter.subscribe(move || counter.set(counter.get() + 1));
//!
//! filter.set_many(json!({"MinPrice": 3, "Name": "lamp"})).unwrap();
//! filter.set("MinPrice", 3).unwrap();
//! assert_eq!(changes.get(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::converter::Meta;
use crate::error::{Result, SiftError};
use crate::hooks::{Candidate, HookContext, HookPhase};
use crate::merge::conjoin;
use crate::notify::{Changes, Listeners, SubscriptionId, Tracker};
use crate::spec::FilterSpec;
use crate::value::{Document, Value};

/// The stored value of one set filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub value: Value,
    pub enabled: bool,
}

impl Slot {
    pub(crate) fn same_as(&self, other: &Slot) -> bool {
        self.enabled == other.enabled && self.value.same_as(&other.value)
    }
}

/// Name to slot. A missing name is an unset filter.
pub(crate) type State = IndexMap<String, Slot>;

/// State equality for change detection: NaN values compare equal.
pub(crate) fn same_state(a: &State, b: &State) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(name, slot)| b.get(name).is_some_and(|other| slot.same_as(other)))
}

/// One or several filter names.
///
/// Implemented for `&str`, `String`, and arrays, slices and vectors of
/// either, so `unset("A")` and `unset(["A", "B"])` both work.
pub trait IntoNames {
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> IntoNames for Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoNames for &[S] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoNames for [S; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

/// Interprets a payload as a document of filter values.
fn values_document(values: Value) -> Result<Document> {
    match values {
        Value::Document(doc) => Ok(doc),
        Value::Null => Ok(Document::new()),
        other => Err(SiftError::validation(
            "values",
            &other,
            "expected a document of filter values",
        )),
    }
}

/// Mutable set of filter values bound to one [`FilterSpec`].
pub struct FilterInstance {
    spec: FilterSpec,
    state: State,
    baseline: Rc<State>,
    tracker: Tracker,
    listeners: Listeners,
}

impl FilterInstance {
    pub(crate) fn new(spec: FilterSpec) -> Self {
        FilterInstance {
            spec,
            state: State::new(),
            baseline: Rc::new(State::new()),
            tracker: Tracker::default(),
            listeners: Listeners::new(),
        }
    }

    /// Builds an instance whose baseline is `values`.
    pub(crate) fn with_values(spec: FilterSpec, values: Value) -> Result<Self> {
        let mut instance = FilterInstance::new(spec);
        instance.set_many(values).map_err(SiftError::construction)?;
        instance.baseline = Rc::new(instance.state.clone());
        debug!(filters = instance.state.len(), "filter instance created");
        Ok(instance)
    }

    /// Runs `f` as one notification batch.
    ///
    /// Listeners fire after the outermost batch ends, whether or not `f`
    /// failed, for whatever it managed to change.
    fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.tracker.pause(&self.state);
        let result = f(self);
        if let Some(changes) = self.tracker.resume(&self.state) {
            self.notify(changes);
        }
        result
    }

    fn notify(&mut self, changes: Changes) {
        for name in &changes.names {
            trace!(filter = %name, "notifying filter listeners");
            self.listeners.fire(name);
        }
        if changes.root {
            trace!(changed = changes.names.len(), "notifying instance listeners");
            self.listeners.fire_root();
        }
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.spec.contains(name) {
            Ok(())
        } else {
            Err(SiftError::unknown_filter(name))
        }
    }

    fn check_names(&self, names: &[String]) -> Result<()> {
        names.iter().try_for_each(|name| self.check_name(name))
    }

    // --- Mutations ---

    /// Sets one filter.
    ///
    /// Runs the filter's before-set hooks, which may substitute the value.
    /// A value equal to the stored one changes nothing. Otherwise the value is
    /// validated by the filter's converter and stored; a newly set filter is
    /// enabled, a disabled one stays disabled.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.batch(|this| this.set_one(name, value))
    }

    /// Sets every filter named in `values`, a document of name to value.
    ///
    /// Keys are applied in order. Not transactional: when one fails, the keys
    /// before it stay applied.
    pub fn set_many(&mut self, values: impl Into<Value>) -> Result<()> {
        let values = values_document(values.into())?;
        self.batch(|this| {
            for (name, value) in values {
                this.set_one(&name, value)?;
            }
            Ok(())
        })
    }

    fn set_one(&mut self, name: &str, value: Value) -> Result<()> {
        let spec = self.spec.clone();
        let descriptor = spec.descriptor(name)?;

        let mut candidate = Candidate::new(value);
        descriptor
            .hooks()
            .run_before_set(&mut HookContext::new(name, self), &mut candidate)?;
        let value = candidate.into_value();

        let enabled = match self.state.get(name) {
            Some(slot) if slot.value.same_as(&value) => {
                trace!(filter = name, "value unchanged, set skipped");
                return Ok(());
            }
            Some(slot) => slot.enabled,
            None => true,
        };
        descriptor.converter().convert(&value)?;

        self.state.insert(name.to_string(), Slot { value, enabled });
        self.tracker.touch(name);
        debug!(filter = name, enabled, "filter set");
        Ok(())
    }

    /// Unsets one or several filters. Unset filters are skipped.
    pub fn unset(&mut self, names: impl IntoNames) -> Result<()> {
        let names = names.into_names();
        self.check_names(&names)?;
        self.batch(|this| {
            for name in &names {
                this.unset_one(name)?;
            }
            Ok(())
        })
    }

    fn unset_one(&mut self, name: &str) -> Result<()> {
        if !self.state.contains_key(name) {
            return Ok(());
        }
        let spec = self.spec.clone();
        let descriptor = spec.descriptor(name)?;
        descriptor
            .hooks()
            .run(HookPhase::BeforeUnset, &mut HookContext::new(name, self))?;

        if self.state.shift_remove(name).is_some() {
            self.tracker.touch(name);
            debug!(filter = name, "filter unset");
        }
        Ok(())
    }

    /// Enables one or several set filters.
    pub fn enable(&mut self, names: impl IntoNames) -> Result<()> {
        self.toggle(names.into_names(), true)
    }

    /// Disables one or several set filters, keeping their values.
    pub fn disable(&mut self, names: impl IntoNames) -> Result<()> {
        self.toggle(names.into_names(), false)
    }

    fn toggle(&mut self, names: Vec<String>, enabled: bool) -> Result<()> {
        self.check_names(&names)?;
        self.batch(|this| {
            for name in &names {
                this.toggle_one(name, enabled)?;
            }
            Ok(())
        })
    }

    fn toggle_one(&mut self, name: &str, enabled: bool) -> Result<()> {
        let needs_flip = |state: &State| state.get(name).is_some_and(|slot| slot.enabled != enabled);
        if !needs_flip(&self.state) {
            return Ok(());
        }

        let phase = if enabled {
            HookPhase::BeforeEnable
        } else {
            HookPhase::BeforeDisable
        };
        let spec = self.spec.clone();
        let descriptor = spec.descriptor(name)?;
        descriptor
            .hooks()
            .run(phase, &mut HookContext::new(name, self))?;

        // The hook may have changed the state itself.
        if !needs_flip(&self.state) {
            trace!(filter = name, %phase, "state changed by hook, toggle abandoned");
            return Ok(());
        }
        if let Some(slot) = self.state.get_mut(name) {
            slot.enabled = enabled;
            self.tracker.touch(name);
            debug!(filter = name, enabled, "filter toggled");
        }
        Ok(())
    }

    /// Unsets every filter.
    pub fn clear(&mut self) -> Result<()> {
        self.clear_with(Document::new())
    }

    /// Unsets every filter not named in `values`, then sets `values`.
    pub fn clear_with(&mut self, values: impl Into<Value>) -> Result<()> {
        let values = values_document(values.into())?;
        self.batch(|this| {
            let stale: Vec<String> = this
                .state
                .keys()
                .filter(|name| !values.contains_key(name.as_str()))
                .cloned()
                .collect();
            for name in &stale {
                this.unset_one(name)?;
            }
            for (name, value) in values {
                this.set_one(&name, value)?;
            }
            debug!(filters = this.state.len(), "filters cleared");
            Ok(())
        })
    }

    /// Restores the values the instance was constructed with.
    pub fn reset(&mut self) -> Result<()> {
        self.reset_with(Document::new())
    }

    /// Restores the construction-time values, then sets `values`.
    ///
    /// The restore bypasses unset hooks; `values` go through [`set`](Self::set)
    /// semantics.
    pub fn reset_with(&mut self, values: impl Into<Value>) -> Result<()> {
        let values = values_document(values.into())?;
        self.batch(|this| {
            let restored = (*this.baseline).clone();
            let previous = std::mem::replace(&mut this.state, restored);
            for name in previous.keys().chain(this.baseline.keys()) {
                this.tracker.touch(name);
            }
            for (name, value) in values {
                this.set_one(&name, value)?;
            }
            debug!(filters = this.state.len(), "filters reset");
            Ok(())
        })
    }

    /// Creates an independent instance seeded with this one's enabled values.
    ///
    /// The fork shares the reset baseline but not the listeners.
    pub fn fork(&self) -> FilterInstance {
        let mut forked = FilterInstance::new(self.spec.clone());
        forked.baseline = Rc::clone(&self.baseline);
        forked.state = self
            .state
            .iter()
            .filter(|(_, slot)| slot.enabled)
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect();
        debug!(filters = forked.state.len(), "filter instance forked");
        forked
    }

    /// [`fork`](Self::fork), then sets `values` on the fork.
    pub fn fork_with(&self, values: impl Into<Value>) -> Result<FilterInstance> {
        let mut forked = self.fork();
        forked.set_many(values).map_err(SiftError::construction)?;
        Ok(forked)
    }

    // --- Reads ---

    /// A copy of the stored value, enabled or not. `None` when unset.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        self.check_name(name)?;
        Ok(self.state.get(name).map(|slot| slot.value.clone()))
    }

    /// `true` if the filter is set and enabled.
    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        self.check_name(name)?;
        Ok(self.state.get(name).is_some_and(|slot| slot.enabled))
    }

    /// `true` if the filter has a value, enabled or not.
    pub fn is_set(&self, name: &str) -> Result<bool> {
        self.check_name(name)?;
        Ok(self.state.contains_key(name))
    }

    /// Enabled values by name, in specification order.
    ///
    /// The result has the shape [`FilterSpec::instance_with`] accepts.
    pub fn save(&self) -> Document {
        self.enabled()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// The query for the enabled filters.
    pub fn query(&self) -> Result<Document> {
        self.build_query(None)
    }

    /// The query for the enabled filters, with `extra` as first fragment.
    pub fn query_with(&self, extra: impl Into<Value>) -> Result<Document> {
        let extra = match extra.into() {
            Value::Document(doc) => doc,
            other => {
                return Err(SiftError::validation(
                    "query",
                    &other,
                    "extra fragment must be a document",
                ))
            }
        };
        self.build_query(Some(extra))
    }

    fn build_query(&self, extra: Option<Document>) -> Result<Document> {
        let mut fragments: Vec<Document> = extra.into_iter().collect();
        for (name, value) in self.enabled() {
            let descriptor = self.spec.descriptor(name)?;
            match descriptor.converter().convert(value)? {
                Value::Document(fragment) => fragments.push(fragment),
                other => {
                    return Err(SiftError::validation(
                        name,
                        &other,
                        "converter did not produce a query fragment",
                    ))
                }
            }
        }
        Ok(conjoin(fragments))
    }

    /// Enabled `(name, value)` pairs in specification order.
    fn enabled(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.spec.descriptors().filter_map(|descriptor| {
            let name = descriptor.name();
            self.state
                .get(name)
                .filter(|slot| slot.enabled)
                .map(|slot| (name, &slot.value))
        })
    }

    // --- Specification accessors ---

    pub fn names(&self) -> Vec<String> {
        self.spec.names()
    }

    /// Metadata of one filter. Metadata lives on the shared specification,
    /// so every instance of it sees the same values.
    pub fn meta(&self, name: &str) -> Result<Meta> {
        self.spec.meta(name)
    }

    pub fn meta_all(&self) -> IndexMap<String, Meta> {
        self.spec.meta_all()
    }

    /// Merges into a filter's metadata on the shared specification.
    pub fn set_meta(&self, name: &str, meta: Meta) -> Result<()> {
        self.spec.set_meta(name, meta)
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.spec.type_tag()
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    // --- Subscriptions ---

    /// Calls `listener` after every operation that changed the state.
    pub fn subscribe<F: FnMut() + 'static>(&mut self, listener: F) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Calls `listener` after every operation that changed filter `name`.
    pub fn subscribe_filter<F: FnMut() + 'static>(
        &mut self,
        name: &str,
        listener: F,
    ) -> Result<SubscriptionId> {
        self.check_name(name)?;
        Ok(self.listeners.subscribe_name(name, listener))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl fmt::Debug for FilterInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterInstance")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("listeners", &self.listeners)
            .field("batch_depth", &self.tracker.depth())
            .finish()
    }
}
