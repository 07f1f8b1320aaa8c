#![forbid(unsafe_code)]

//! Errors raised while compiling templates or dispatching bound events.

use thiserror::Error;
use weft_core::ReactiveError;

/// Failure establishing or running a binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Expression resolution failed.
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
    /// A directive attribute names a kind the dispatch table does not know.
    #[error("unknown directive `{name}`")]
    UnknownDirective { name: String },
    /// A directive that needs a `:detail` suffix was used without one.
    #[error("directive `{directive}` requires an argument (`{directive}:<name>`)")]
    MissingArgument { directive: String },
    /// An event fired for a method that is not in the method table.
    #[error("no method named `{name}`")]
    MissingHandler { name: String },
    /// Directive and event prefixes cannot be told apart.
    #[error("ambiguous directive syntax: `{directive_prefix}` and `{event_prefix}`")]
    AmbiguousSyntax {
        directive_prefix: String,
        event_prefix: String,
    },
}
