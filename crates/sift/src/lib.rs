//! Sift - declarative filter specifications that compile to document queries.
//!
//! Sift lets an application declare the filters a listing offers, hold the
//! values a user picked, and turn them into one query document for a
//! document database. It provides:
//!
//! - A library of validating fragment factories: comparison, membership,
//!   boolean combinators, element, evaluation and array operators
//! - Merge-minimization of fragments, so independent filters flatten into one
//!   document while colliding constraints stay explicitly conjoined
//! - Shape-aware negation that only emits `$not` where it is legal
//! - A stateful filter instance with enable/disable, reset to baseline,
//!   lifecycle hooks and batched change notifications
//!
//! Sift never executes a query; it only builds one.
//!
//! # Quick Start
//!
//! ```rust
//! use sift::{ops, FilterConfig, FilterSpec, SpecInput, Value};
//! use serde_json::json;
//!
//! // Declare the filters once
//! let products = FilterSpec::create(
//!     SpecInput::new()
//!         .filter("MinPrice", ops::gte("price").unwrap())
//!         .filter("MaxPrice", ops::lte("price").unwrap())
//!         .filter(
//!             "Search",
//!             FilterConfig::new(ops::pattern("name", "i").unwrap()).meta("label", "Name"),
//!         )
//!         .filter("Hidden", ops::not(ops::eq("status").unwrap()))
//!         .with_type("products"),
//! )
//! .unwrap();
//!
//! // One instance per listing, seeded from e.g. a saved URL state
//! let mut filter = products.instance_with(json!({"MinPrice": 10})).unwrap();
//! filter.set("MaxPrice", "25").unwrap();
//! filter.set("Hidden", "archived").unwrap();
//!
//! let query = filter.query().unwrap();
//! assert_eq!(
//!     Value::from(query),
//!     Value::from(json!({
//!         "price": {"$gte": 10},
//!         "status": {"$not": {"$eq": "archived"}},
//!         "$and": [{"price": {"$lte": 25}}]
//!     }))
//! );
//!
//! // Disabled filters keep their value but leave the query
//! filter.disable("MaxPrice").unwrap();
//! assert_eq!(
//!     Value::from(filter.save()),
//!     Value::from(json!({"MinPrice": 10, "Hidden": "archived"}))
//! );
//!
//! // Back to the construction-time values
//! filter.reset().unwrap();
//! assert_eq!(Value::from(filter.save()), Value::from(json!({"MinPrice": 10})));
//! ```
//!
//! # Fragment Shapes
//!
//! | Factory | Fragment |
//! |---------|----------|
//! | `eq(f)` | `{f: v}` |
//! | `ne`, `gt`, `gte`, `lt`, `lte`, `is_in`, `not_in` | `{f: {$op: v}}` |
//! | `and(..)` | merge-minimized document |
//! | `or(..)` | `{$or: [...]}`, unwrapped when single |
//! | `nor(..)` | `{$nor: [...]}` |
//! | `not(c)` | shape-dependent, see below |
//! | `exists(f)`, `type_of(f, code)`, `modulo(f)`, `size(f)`, `all(f)`, `elem_match(f)` | `{f: {$op: v}}` |
//! | `regex(f, p, o)`, `pattern(f, o)` | `{f: /p/o}` |
//! | `text(lang)` | `{$text: {$search: v, $language: lang}}` |
//! | `where_fn(p)` | `{$where: p}` |
//!
//! # Negation
//!
//! `not` restructures the wrapped fragment:
//!
//! ```text
//! {$where: p}                →  {$where: !p}
//! {f: /re/}                  →  {f: {$not: /re/}}
//! {f: {$regex: .., $options}}→  {f: {$not: /re/opts}}
//! {f: {$gt: 3}}              →  {f: {$not: {$gt: 3}}}
//! {f: v}                     →  {f: {$not: {$eq: v}}}
//! anything else              →  {$nor: [fragment]}
//! ```
//!
//! # Logging
//!
//! Specification construction and instance mutations are logged through
//! [`tracing`] at `debug` level; skipped sets and fired notifications at
//! `trace`. Sift never installs a subscriber.

mod clause;
mod converter;
mod error;
mod hooks;
mod instance;
mod merge;
mod negate;
mod notify;
mod op;
pub mod ops;
mod predicate;
mod regex_lit;
mod spec;
mod value;

// Re-export public API
pub use clause::Clause;
pub use converter::{ConvertFn, Converter, Meta};
pub use error::{ErrorKind, Result, SiftError};
pub use hooks::{Candidate, HookContext, HookFn, HookPhase, Hooks, SetHookFn};
pub use instance::{FilterInstance, IntoNames};
pub use merge::{conjoin, disjoin};
pub use notify::{Listeners, SubscriptionId};
pub use op::Op;
pub use ops::Branches;
pub use predicate::{PredicateFn, WherePredicate};
pub use regex_lit::RegexLit;
pub use spec::{FilterConfig, FilterDescriptor, FilterEntry, FilterSpec, SpecInput};
pub use value::{Document, Number, Timestamp, Value};
