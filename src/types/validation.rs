//! Validation errors raised at record construction.
//!
//! Every value object in [`crate::types`] is constructed through a
//! fallible `new`/`TryFrom` that rejects malformed data at the boundary —
//! per §3, "implementers must reject malformed records rather than
//! propagate partial data."

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must match {pattern:?}, got {value:?}")]
    PatternMismatch {
        field: &'static str,
        pattern: &'static str,
        value: String,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{context}: expected option_numbers {{1,2,3,4}} exactly, got {got:?}")]
    OptionNumberSet { context: &'static str, got: Vec<u8> },

    #[error("{context}: expected each option_type to appear exactly once, got {got:?}")]
    OptionTypeSet {
        context: &'static str,
        got: Vec<String>,
    },

    #[error("colors must cover roles {missing:?}")]
    MissingColorRoles { missing: Vec<String> },

    #[error("locked copy mismatch: direction {option_number} field {field} = {actual:?}, brief requires {expected:?}")]
    LockedCopyMismatch {
        option_number: u8,
        field: &'static str,
        expected: String,
        actual: String,
    },
}
