//! Error types for the sift crate.
//!
//! Every failure is one of four kinds (see [`ErrorKind`]):
//!
//! - **Configuration**: a filter name the specification does not know, or an
//!   unusable specification input.
//! - **Validation**: a value that does not satisfy a converter's contract.
//! - **Construction**: an instance could not be built from its initial values.
//! - **Hook**: a user lifecycle hook refused the operation.

use std::fmt;

use thiserror::Error;

use crate::hooks::HookPhase;
use crate::value::Value;

/// Errors that can occur when declaring filters, converting values or
/// mutating a filter instance.
#[derive(Debug, Error)]
pub enum SiftError {
    /// The name does not belong to the specification.
    #[error("no such filter: '{name}'")]
    UnknownFilter { name: String },

    /// The specification input cannot be used.
    #[error("invalid filter specification: {reason}")]
    InvalidSpec { reason: String },

    /// Two filters in one specification share a name.
    #[error("duplicate filter name '{name}' in specification")]
    DuplicateFilter { name: String },

    /// A value failed a converter's shape or type contract.
    #[error("invalid value for '{field}': {reason} (got {value})")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Regex option letter outside `i`, `m`, `s`, `x`.
    #[error("invalid regex option '{0}'")]
    InvalidRegexFlag(char),

    /// Initial values passed to an instance were rejected.
    #[error("failed to construct filter instance: {source}")]
    Construction {
        #[source]
        source: Box<SiftError>,
    },

    /// A lifecycle hook aborted the operation.
    #[error("{phase} hook failed for filter '{name}': {message}")]
    Hook {
        name: String,
        phase: HookPhase,
        message: String,
    },
}

/// Broad classification of a [`SiftError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Construction,
    Hook,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Construction => write!(f, "construction"),
            ErrorKind::Hook => write!(f, "hook"),
        }
    }
}

impl SiftError {
    /// Creates a validation error for `field` rejecting `value`.
    pub fn validation(field: impl Into<String>, value: &Value, reason: impl Into<String>) -> Self {
        SiftError::Validation {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a validation error for a converter called without a value.
    pub fn missing_value(field: impl Into<String>) -> Self {
        SiftError::Validation {
            field: field.into(),
            value: "nothing".to_string(),
            reason: "a value is required".to_string(),
        }
    }

    pub fn unknown_filter(name: impl Into<String>) -> Self {
        SiftError::UnknownFilter { name: name.into() }
    }

    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        SiftError::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Creates an error a hook can return to abort the current operation.
    pub fn hook(name: impl Into<String>, phase: HookPhase, message: impl Into<String>) -> Self {
        SiftError::Hook {
            name: name.into(),
            phase,
            message: message.into(),
        }
    }

    /// Wraps an error raised while applying an instance's initial values.
    pub(crate) fn construction(source: SiftError) -> Self {
        SiftError::Construction {
            source: Box::new(source),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SiftError::UnknownFilter { .. }
            | SiftError::InvalidSpec { .. }
            | SiftError::DuplicateFilter { .. } => ErrorKind::Configuration,
            SiftError::Validation { .. }
            | SiftError::InvalidRegex(_)
            | SiftError::InvalidRegexFlag(_) => ErrorKind::Validation,
            SiftError::Construction { .. } => ErrorKind::Construction,
            SiftError::Hook { .. } => ErrorKind::Hook,
        }
    }
}

/// Result type for sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_field_and_value() {
        let err = SiftError::validation("price", &Value::from("abc"), "not a number");
        assert_eq!(
            err.to_string(),
            "invalid value for 'price': not a number (got \"abc\")"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn construction_keeps_source() {
        let err = SiftError::construction(SiftError::missing_value("price"));
        assert_eq!(err.kind(), ErrorKind::Construction);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("invalid value for 'price': a value is required (got nothing)")
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(
            SiftError::unknown_filter("x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(SiftError::invalid_spec("x").kind(), ErrorKind::Configuration);
        assert_eq!(SiftError::InvalidRegexFlag('q').kind(), ErrorKind::Validation);
        assert_eq!(
            SiftError::hook("x", HookPhase::BeforeSet, "no").kind(),
            ErrorKind::Hook
        );
    }

    #[test]
    fn hook_message() {
        let err = SiftError::hook("MinPrice", HookPhase::BeforeUnset, "locked");
        assert_eq!(
            err.to_string(),
            "before-unset hook failed for filter 'MinPrice': locked"
        );
    }
}
