#![forbid(unsafe_code)]

//! Errors raised while resolving expressions against the state tree.

use thiserror::Error;

/// Failure while reading or writing a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A segment was looked up on a value that has no properties.
    #[error("cannot resolve `{path}`: segment `{segment}` was looked up on a {found} value")]
    PathResolution {
        /// The full expression being resolved.
        path: String,
        /// The segment that could not be looked up.
        segment: String,
        /// Type name of the value the segment was looked up on.
        found: &'static str,
    },
    /// The expression was empty or whitespace.
    #[error("empty expression")]
    EmptyExpression,
}
