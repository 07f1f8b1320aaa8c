#![forbid(unsafe_code)]

//! Contracts between the compiler and the UI tree it binds to.
//!
//! The compiler never owns the rendered tree. It walks it through
//! [`TemplateTree`] and mutates it through [`RenderTarget`]; both are
//! implemented by the host toolkit (see `weft-dom` for the in-memory one).
//! Methods take `&self` because binding callbacks keep a clone of the host
//! and call back into it long after compilation.

use std::rc::Rc;

use weft_core::Value;

use crate::error::BindError;

/// Event name the two-way value directive listens to.
pub const INPUT_EVENT: &str = "input";

/// Stable handle to a node of the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the compiler treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Attributes are inspected for directives.
    Element,
    /// Content is scanned for `{{ }}` interpolation.
    Text,
    /// Anything else (raw markup, comments): skipped.
    Other,
}

/// An event delivered by the host.
#[derive(Debug, Clone)]
pub struct Event {
    /// Node the listener was registered on.
    pub target: NodeId,
    /// Event name, e.g. `"click"` or `"input"`.
    pub name: String,
    /// Payload; for input events, the edited control value.
    pub value: Value,
}

impl Event {
    #[must_use]
    pub fn new(target: NodeId, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            target,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Listener registered through [`RenderTarget::on_event`].
pub type EventHandler = Rc<dyn Fn(&Event) -> Result<(), BindError>>;

/// Mutations the bindings perform on the rendered output.
pub trait RenderTarget {
    /// Replace the text content of `node`.
    fn set_text(&self, node: NodeId, text: &str);

    /// Replace the content of `node` with raw, unsanitized markup.
    fn set_markup(&self, node: NodeId, markup: &str);

    /// Set the current value of an input control.
    fn set_control_value(&self, node: NodeId, value: &str);

    /// Set a plain attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Subscribe `handler` to `event` on `node`.
    fn on_event(&self, node: NodeId, event: &str, handler: EventHandler);

    /// Extract the edited control value carried by `event`.
    fn read_control_value(&self, event: &Event) -> Value;
}

/// Read access and structural edits needed to walk a template.
pub trait TemplateTree {
    fn kind(&self, node: NodeId) -> NodeKind;

    /// Children of `node`, as a snapshot the caller may mutate around.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Attributes of an element in document order, as a snapshot.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Content of a text node.
    fn text(&self, node: NodeId) -> String;

    /// Detach every child of `node` into a fresh off-tree fragment.
    fn stage_children(&self, node: NodeId) -> NodeId;

    /// Append every child of `staged` back onto `node`.
    fn restore_children(&self, staged: NodeId, node: NodeId);
}

/// Everything the compiler needs from a host.
pub trait TemplateHost: RenderTarget + TemplateTree + Clone + 'static {}

impl<T: RenderTarget + TemplateTree + Clone + 'static> TemplateHost for T {}

/// Resolves event-directive method names when the event fires.
pub trait MethodDispatch {
    /// Call the method called `name` with `event`.
    ///
    /// # Errors
    ///
    /// [`BindError::MissingHandler`] when no such method exists, or the
    /// method's own error.
    fn invoke(&self, name: &str, event: &Event) -> Result<(), BindError>;
}
