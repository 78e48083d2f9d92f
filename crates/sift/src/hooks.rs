//! Lifecycle hooks for filter mutations.
//!
//! Hooks run synchronously just before a filter instance changes a filter's
//! state:
//!
//! ```text
//! set(name, value)
//!   → BEFORE-SET hooks ← (may substitute the value, may abort)
//!   → equality check, validation, store
//! unset(name)   → BEFORE-UNSET hooks   → remove
//! enable(name)  → BEFORE-ENABLE hooks  → re-check → flip
//! disable(name) → BEFORE-DISABLE hooks → re-check → flip
//! ```
//!
//! Every hook receives a [`HookContext`] naming the filter and giving mutable
//! access to the owning instance, so a hook may itself set or unset other
//! filters. Those nested mutations join the outer operation's notification
//! batch.
//!
//! A filter can get hooks from two places: attached to its converter and
//! given in its config. [`Hooks::then`] concatenates the two bundles so the
//! converter's hooks run first.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::instance::FilterInstance;
use crate::value::Value;

/// The hook point at which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BeforeSet,
    BeforeUnset,
    BeforeEnable,
    BeforeDisable,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeSet => write!(f, "before-set"),
            HookPhase::BeforeUnset => write!(f, "before-unset"),
            HookPhase::BeforeEnable => write!(f, "before-enable"),
            HookPhase::BeforeDisable => write!(f, "before-disable"),
        }
    }
}

/// What a hook sees: the filter's name and its owning instance.
pub struct HookContext<'a> {
    name: &'a str,
    filter: &'a mut FilterInstance,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(name: &'a str, filter: &'a mut FilterInstance) -> Self {
        HookContext { name, filter }
    }

    /// Name of the filter being changed.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The instance that owns the filter.
    pub fn filter(&self) -> &FilterInstance {
        &*self.filter
    }

    /// Mutable access to the owning instance.
    pub fn filter_mut(&mut self) -> &mut FilterInstance {
        &mut *self.filter
    }
}

/// The value a `set` is about to store.
///
/// A before-set hook may [`replace`](Candidate::replace) it. The candidate is
/// only borrowed for the duration of the hook call, so a substitution cannot
/// be deferred past it.
#[derive(Debug)]
pub struct Candidate {
    value: Value,
}

impl Candidate {
    pub(crate) fn new(value: Value) -> Self {
        Candidate { value }
    }

    /// The current candidate value, including earlier substitutions.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Substitutes the value that will be stored.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }
}

/// Type alias for before-set hook functions.
pub type SetHookFn = Rc<dyn Fn(&mut HookContext<'_>, &mut Candidate) -> Result<()>>;

/// Type alias for before-unset, before-enable and before-disable hook functions.
pub type HookFn = Rc<dyn Fn(&mut HookContext<'_>) -> Result<()>>;

/// Per-filter hook configuration.
///
/// Hooks are executed in registration order; the first error aborts the
/// operation.
#[derive(Clone, Default)]
pub struct Hooks {
    before_set: Vec<SetHookFn>,
    before_unset: Vec<HookFn>,
    before_enable: Vec<HookFn>,
    before_disable: Vec<HookFn>,
}

impl Hooks {
    /// Creates a new empty hooks configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.before_set.is_empty()
            && self.before_unset.is_empty()
            && self.before_enable.is_empty()
            && self.before_disable.is_empty()
    }

    /// Number of hooks registered for `phase`.
    pub fn count(&self, phase: HookPhase) -> usize {
        match phase {
            HookPhase::BeforeSet => self.before_set.len(),
            HookPhase::BeforeUnset => self.before_unset.len(),
            HookPhase::BeforeEnable => self.before_enable.len(),
            HookPhase::BeforeDisable => self.before_disable.len(),
        }
    }

    /// Adds a before-set hook.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sift::{Hooks, Value};
    ///
    /// // Store search terms lower-cased.
    /// let hooks = Hooks::new().before_set(|_ctx, candidate| {
    ///     if let Some(s) = candidate.value().as_str() {
    ///         let lowered = s.to_lowercase();
    ///         candidate.replace(lowered);
    ///     }
    ///     Ok(())
    /// });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn before_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &mut Candidate) -> Result<()> + 'static,
    {
        self.before_set.push(Rc::new(f));
        self
    }

    /// Adds a before-unset hook.
    pub fn before_unset<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.before_unset.push(Rc::new(f));
        self
    }

    /// Adds a before-enable hook.
    pub fn before_enable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.before_enable.push(Rc::new(f));
        self
    }

    /// Adds a before-disable hook.
    pub fn before_disable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + 'static,
    {
        self.before_disable.push(Rc::new(f));
        self
    }

    /// Combines two bundles: `self`'s hooks run first, then `other`'s.
    pub fn then(&self, other: &Hooks) -> Hooks {
        let mut combined = self.clone();
        combined.before_set.extend(other.before_set.iter().cloned());
        combined.before_unset.extend(other.before_unset.iter().cloned());
        combined.before_enable.extend(other.before_enable.iter().cloned());
        combined
            .before_disable
            .extend(other.before_disable.iter().cloned());
        combined
    }

    /// Runs all before-set hooks, each seeing earlier substitutions.
    pub(crate) fn run_before_set(
        &self,
        ctx: &mut HookContext<'_>,
        candidate: &mut Candidate,
    ) -> Result<()> {
        for hook in &self.before_set {
            hook(ctx, candidate)?;
        }
        Ok(())
    }

    /// Runs the hooks of a phase that takes no value.
    ///
    /// `HookPhase::BeforeSet` has its own runner and is a no-op here.
    pub(crate) fn run(&self, phase: HookPhase, ctx: &mut HookContext<'_>) -> Result<()> {
        let hooks = match phase {
            HookPhase::BeforeSet => return Ok(()),
            HookPhase::BeforeUnset => &self.before_unset,
            HookPhase::BeforeEnable => &self.before_enable,
            HookPhase::BeforeDisable => &self.before_disable,
        };
        for hook in hooks {
            hook(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_set_count", &self.before_set.len())
            .field("before_unset_count", &self.before_unset.len())
            .field("before_enable_count", &self.before_enable.len())
            .field("before_disable_count", &self.before_disable.len())
            .finish()
    }
}
