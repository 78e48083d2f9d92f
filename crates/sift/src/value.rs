//! Plain nested data: filter input values and query fragments.
//!
//! The [`Value`] enum is both what users store in a filter instance and what
//! converters produce. It covers the JSON shapes plus the three query-language
//! extras that JSON cannot express: dates ([`Timestamp`]), regular expressions
//! ([`RegexLit`]) and `$where` predicates ([`WherePredicate`]).
//!
//! `Clone` is the deep copy and `PartialEq` the deep equality the filter
//! instance relies on.

use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::predicate::WherePredicate;
use crate::regex_lit::{self, RegexLit};

/// An insertion-ordered mapping of keys to values.
///
/// Equality ignores key order; iteration follows insertion order, which keeps
/// produced queries deterministic.
pub type Document = IndexMap<String, Value>;

/// Owned, nested value.
///
/// # Example
///
/// ```
/// use sift::{Number, Value};
/// use serde_json::json;
///
/// let value = Value::from(json!({"price": {"$gt": 3}}));
/// let inner = value.as_document().and_then(|d| d.get("price"));
/// assert!(inner.is_some());
/// assert_eq!(Value::from(3i64), Value::Number(Number::F64(3.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// Date-like value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Concrete regular expression.
    Regex(RegexLit),
    /// Ordered list.
    Array(Vec<Value>),
    /// Keyed mapping.
    Document(Document),
    /// Bound `$where` predicate.
    Where(WherePredicate),
}

impl Value {
    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a `Document`.
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    /// Returns `true` if this is an `Array`.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Truthiness: `null`, `false`, `0`, NaN and `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_nan() && n.to_f64() != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Deep equality where NaN matches NaN.
    ///
    /// Change detection uses this, so a stored NaN is not reported as
    /// modified by every batch.
    pub(crate) fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Value::Document(a), Value::Document(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| x.same_as(y)))
            }
            _ => self == other,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Timestamp(_) => "date",
            Value::Regex(_) => "regex",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
            Value::Where(_) => "predicate",
        }
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the number value, if present. No coercion.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Coerces to a number.
    ///
    /// Numbers pass through, booleans become `0`/`1`, and strings are trimmed
    /// and parsed (the empty string is `0`). Everything else, and any NaN
    /// result, yields `None`.
    pub fn to_number(&self) -> Option<Number> {
        let number = match self {
            Value::Number(n) => *n,
            Value::Bool(b) => Number::I64(i64::from(*b)),
            Value::String(s) => parse_number(s.trim())?,
            _ => return None,
        };
        if number.is_nan() {
            None
        } else {
            Some(number)
        }
    }

    /// Coerces to an integer, truncating toward zero.
    pub fn to_integer(&self) -> Option<i64> {
        self.to_number()?.to_i64()
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() {
        return Some(Number::I64(0));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(Number::I64(n));
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Number::F64(f)),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Timestamp(ts) => write!(f, "Date({})", ts.as_millis()),
            Value::Regex(regex) => write!(f, "{regex}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Document(doc) => {
                f.write_str("{")?;
                for (i, (key, item)) in doc.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                f.write_str("}")
            }
            Value::Where(_) => f.write_str("[where predicate]"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.collect_map([("$date", ts.as_millis())]),
            Value::Regex(regex) => serializer.collect_map([
                ("$regex", regex.pattern()),
                ("$options", regex.flags()),
            ]),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Document(doc) => serializer.collect_map(doc),
            Value::Where(_) => Err(S::Error::custom(
                "a $where predicate cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(Number::from(n)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let doc: Document = map
                    .into_iter()
                    .map(|(key, item)| (key, Value::from(item)))
                    .collect();
                restore_extended(doc)
            }
        }
    }
}

/// Reverses the extended-JSON forms written by `Serialize`: a lone
/// `{"$date": millis}` becomes a timestamp and a valid `{$regex, $options}`
/// document becomes a regex. Anything else stays a document.
fn restore_extended(doc: Document) -> Value {
    if doc.len() == 1 {
        if let Some(Value::Number(Number::I64(millis))) = doc.get("$date") {
            return Value::Timestamp(Timestamp::from_millis(*millis));
        }
    }
    match regex_lit::compact("$regex", &doc) {
        Ok(Some(regex)) => Value::Regex(regex),
        _ => Value::Document(doc),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<RegexLit> for Value {
    fn from(regex: RegexLit) -> Self {
        Value::Regex(regex)
    }
}

impl From<WherePredicate> for Value {
    fn from(predicate: WherePredicate) -> Self {
        Value::Where(predicate)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Equality is numeric across variants, so `I64(3) == F64(3.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(f) if f.is_nan())
    }

    /// Converts to `i64`, truncating finite floats toward zero.
    ///
    /// Returns `None` for NaN, infinities and out-of-range values.
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Number::I64(n) => Some(n),
            Number::U64(n) => i64::try_from(n).ok(),
            Number::F64(f) => {
                let t = f.trunc();
                if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    Some(t as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            // Same type comparisons
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),

            // Mixed type comparisons - convert to f64
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::I64(n) => serializer.serialize_i64(*n),
            Number::U64(n) => serializer.serialize_u64(*n),
            Number::F64(n) => serializer.serialize_f64(*n),
        }
    }
}

impl From<serde_json::Number> for Number {
    fn from(n: serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Number::I64(i)
        } else if let Some(u) = n.as_u64() {
            Number::U64(u)
        } else {
            Number::F64(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $wide)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Date-like value represented as milliseconds since Unix epoch.
///
/// Serializes as `{"$date": millis}`.
///
/// ```
/// use sift::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0 / 1000
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Timestamp(after.as_millis() as i64),
            Err(before) => Timestamp(-(before.duration().as_millis() as i64)),
        }
    }
}
