//! Query-language operators.
//!
//! The [`Op`] enum names every operator key a fragment can contain, organized
//! by family. [`Op::as_str`] gives the `$`-prefixed key as it appears in a
//! query document.

/// Operator key in a query document.
///
/// Operators are grouped by family:
/// - **Comparison**: `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte`, `In`, `Nin`
/// - **Logical**: `And`, `Or`, `Nor`, `Not`
/// - **Element**: `Exists`, `Type`
/// - **Evaluation**: `Mod`, `Regex` (with `Options`), `Text` (with `Search`,
///   `Language`), `Where`
/// - **Array**: `All`, `ElemMatch`, `Size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // Comparison operators
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Value is one of the given set.
    In,
    /// Value is none of the given set.
    Nin,

    // Logical operators
    And,
    Or,
    Nor,
    Not,

    // Element operators
    /// Field presence.
    Exists,
    /// BSON type code.
    Type,

    // Evaluation operators
    /// `[divisor, remainder]` test.
    Mod,
    /// Regular expression source.
    Regex,
    /// Regular expression options (companion of `Regex`).
    Options,
    /// Full-text search.
    Text,
    /// Search string (inside `Text`).
    Search,
    /// Language tag (inside `Text`).
    Language,
    /// Predicate evaluated against the whole document.
    Where,

    // Array operators
    /// Array contains all of the given elements.
    All,
    /// Some array element matches a sub-query.
    ElemMatch,
    /// Array length.
    Size,
}

impl Op {
    /// Returns `true` for operators that need an orderable operand.
    pub fn is_ordering(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// Returns the key as written in a query document.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "$eq",
            Op::Ne => "$ne",
            Op::Gt => "$gt",
            Op::Gte => "$gte",
            Op::Lt => "$lt",
            Op::Lte => "$lte",
            Op::In => "$in",
            Op::Nin => "$nin",
            Op::And => "$and",
            Op::Or => "$or",
            Op::Nor => "$nor",
            Op::Not => "$not",
            Op::Exists => "$exists",
            Op::Type => "$type",
            Op::Mod => "$mod",
            Op::Regex => "$regex",
            Op::Options => "$options",
            Op::Text => "$text",
            Op::Search => "$search",
            Op::Language => "$language",
            Op::Where => "$where",
            Op::All => "$all",
            Op::ElemMatch => "$elemMatch",
            Op::Size => "$size",
        }
    }

    /// Returns `true` if `key` is written as an operator (leading `$`).
    pub fn is_operator_key(key: &str) -> bool {
        key.starts_with('$')
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_operators() {
        assert!(Op::Gte.is_ordering());
        assert!(!Op::Eq.is_ordering());
        assert!(!Op::In.is_ordering());
    }

    #[test]
    fn operator_keys() {
        assert!(Op::is_operator_key("$gt"));
        assert!(Op::is_operator_key("$custom"));
        assert!(!Op::is_operator_key("price"));
    }

    #[test]
    fn op_display() {
        assert_eq!(Op::Eq.to_string(), "$eq");
        assert_eq!(Op::ElemMatch.to_string(), "$elemMatch");
        assert_eq!(Op::Where.to_string(), "$where");
    }
}
