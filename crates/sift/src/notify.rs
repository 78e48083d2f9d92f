//! Change notification.
//!
//! A filter instance composes two pieces:
//!
//! - [`Listeners`]: the registry of callbacks, either instance-wide (the
//!   result of `save()` or `query()` may have changed) or for one filter.
//! - [`Tracker`]: the pause/resume batch bookkeeping. Pausing at depth zero
//!   snapshots the state, mutations record the names they touch, and resuming
//!   back to depth zero reports what actually differs from the snapshot.
//!
//! Nested batches only move the depth counter, so a mutation made from a
//! hook during `clear` is reported together with the rest of the `clear`.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::instance::{same_state, State};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut()>;

/// Registered change callbacks.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    root: Vec<(SubscriptionId, Listener)>,
    by_name: IndexMap<String, Vec<(SubscriptionId, Listener)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Registers an instance-wide listener.
    pub fn subscribe<F: FnMut() + 'static>(&mut self, listener: F) -> SubscriptionId {
        let id = self.next_id();
        self.root.push((id, Box::new(listener)));
        id
    }

    /// Registers a listener for one filter name.
    pub fn subscribe_name<F: FnMut() + 'static>(
        &mut self,
        name: impl Into<String>,
        listener: F,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.by_name
            .entry(name.into())
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.len();
        self.root.retain(|(entry, _)| *entry != id);
        for listeners in self.by_name.values_mut() {
            listeners.retain(|(entry, _)| *entry != id);
        }
        self.by_name.retain(|_, listeners| !listeners.is_empty());
        self.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.root.len() + self.by_name.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls the instance-wide listeners.
    pub fn fire_root(&mut self) {
        for (_, listener) in &mut self.root {
            listener();
        }
    }

    /// Calls the listeners registered for `name`.
    pub fn fire(&mut self, name: &str) {
        if let Some(listeners) = self.by_name.get_mut(name) {
            for (_, listener) in listeners {
                listener();
            }
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("root_count", &self.root.len())
            .field("named_count", &(self.len() - self.root.len()))
            .finish()
    }
}

/// What changed over a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Changes {
    /// Touched names whose entry differs from the snapshot.
    pub names: Vec<String>,
    /// Whether the full state differs from the snapshot.
    pub root: bool,
}

/// Pause/resume batch bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    depth: usize,
    snapshot: Option<State>,
    touched: IndexSet<String>,
}

impl Tracker {
    /// Enters a batch. The outermost pause snapshots `state`.
    pub fn pause(&mut self, state: &State) {
        if self.depth == 0 {
            self.snapshot = Some(state.clone());
            self.touched.clear();
        }
        self.depth += 1;
    }

    /// Records a mutation of `name` in the current batch.
    pub fn touch(&mut self, name: &str) {
        self.touched.insert(name.to_string());
    }

    /// Leaves a batch.
    ///
    /// Returns the net changes when the outermost batch ends and something
    /// differs from the snapshot, `None` otherwise.
    pub fn resume(&mut self, state: &State) -> Option<Changes> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return None;
        }
        let snapshot = self.snapshot.take()?;
        let names: Vec<String> = self
            .touched
            .drain(..)
            .filter(|name| match (snapshot.get(name), state.get(name)) {
                (Some(before), Some(after)) => !before.same_as(after),
                (before, after) => before.is_some() != after.is_some(),
            })
            .collect();
        let root = !same_state(&snapshot, state);
        if names.is_empty() && !root {
            return None;
        }
        Some(Changes { names, root })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
