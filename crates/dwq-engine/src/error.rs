//! Runtime errors.
//!
//! Only fatal conditions are errors: they abort the whole query. Advisory
//! conditions (an overload that doesn't match the stack's types, a
//! comparison that is undefined between two values) are reported through
//! tracing and handled in-band — the offending stack is dropped, or the
//! predicate yields `Fail`.

use thiserror::Error;

/// Runtime result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal runtime errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("stack underflow: `{word}` needs {needed} value(s), {available} available")]
    Underflow {
        word: String,
        needed: usize,
        available: usize,
    },

    #[error("read of unbound variable (slot {slot}, {depth} frame(s) up)")]
    UnboundVariable { depth: usize, slot: usize },

    #[error("debug info error: {0}")]
    DebugInfo(String),
}
