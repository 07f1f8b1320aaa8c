#![forbid(unsafe_code)]

//! Template compiler and directive dispatch for Weft.
//!
//! A template is any tree the host exposes through [`TemplateTree`].
//! [`Compiler`] walks it once, recognizes directive attributes
//! (`bind-text`, `bind-markup`, `bind-value`, `bind-attr:<name>`,
//! `bind-on:<event>`, `@<event>`) and `{{ }}` text, and creates one
//! [`weft_core::Watcher`] per reactive binding. Rendering happens through
//! [`RenderTarget`]; event methods are resolved through [`MethodDispatch`]
//! when the event fires.
//!
//! # Example
//!
//! ```ignore
//! let compiled = Compiler::new(dom.clone()).compile(root, &state, &methods)?;
//! // keep `compiled.scope` alive for as long as the bindings should run
//! ```

pub mod compiler;
pub mod directive;
pub mod error;
pub mod host;
pub mod syntax;

#[cfg(test)]
mod testing;

pub use compiler::{CompileStats, Compiled, Compiler};
pub use directive::{Directive, DirectiveContext, DirectiveHandler, DirectiveTable};
pub use error::BindError;
pub use host::{
    Event, EventHandler, INPUT_EVENT, MethodDispatch, NodeId, NodeKind, RenderTarget,
    TemplateHost, TemplateTree,
};
pub use syntax::{Marker, Syntax};
