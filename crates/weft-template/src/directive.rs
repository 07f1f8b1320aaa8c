#![forbid(unsafe_code)]

//! Directive dispatch table.
//!
//! Each directive kind maps to a plain function that establishes one
//! binding on one node. The standard table knows:
//!
//! | Kind | Binding |
//! |------|---------|
//! | `text` | text content, one watcher per `{{ }}` occurrence |
//! | `markup` | raw inner markup, unsanitized |
//! | `value` | control value, two-way through the input event |
//! | `attr:<name>` | static attribute copy of the literal expression, no watcher |
//! | `on:<event>` | event listener calling a named method when fired |
//!
//! Every reactive kind renders once while binding; the watchers it leaves
//! in the [`BindingScope`] take over afterwards.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Bad path | expression cannot be resolved | [`BindError::Reactive`] at bind time |
//! | No detail | `attr` or `on` without `:<name>` | [`BindError::MissingArgument`] |
//! | Missing method | `on` names an unknown method | [`BindError::MissingHandler`] when the event fires |

use std::rc::Rc;

use ahash::AHashMap;
use weft_core::{BindingScope, Value, path};

use crate::error::BindError;
use crate::host::{Event, EventHandler, INPUT_EVENT, MethodDispatch, NodeId, TemplateHost};

pub const TEXT: &str = "text";
pub const MARKUP: &str = "markup";
pub const VALUE: &str = "value";
pub const ATTR: &str = "attr";
pub const ON: &str = "on";

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What a directive handler may touch while binding.
pub struct DirectiveContext<'a, H> {
    pub host: &'a H,
    /// Root the expressions are resolved against.
    pub state: &'a Value,
    pub methods: &'a Rc<dyn MethodDispatch>,
    /// Receives every watcher the handler creates.
    pub scope: &'a mut BindingScope,
}

/// One directive occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    pub node: NodeId,
    /// Attribute value, or the whole content for text nodes.
    pub expr: &'a str,
    /// The part after `:`, when present and non-empty.
    pub detail: Option<&'a str>,
}

impl<'a> Directive<'a> {
    fn require_detail(&self, kind: &str) -> Result<&'a str, BindError> {
        self.detail.ok_or_else(|| BindError::MissingArgument {
            directive: kind.to_string(),
        })
    }
}

/// Establishes one binding.
pub type DirectiveHandler<H> =
    fn(&mut DirectiveContext<'_, H>, &Directive<'_>) -> Result<(), BindError>;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Directive kinds and their handlers.
pub struct DirectiveTable<H> {
    handlers: AHashMap<String, DirectiveHandler<H>>,
}

impl<H: TemplateHost> DirectiveTable<H> {
    /// An empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: AHashMap::new(),
        }
    }

    /// The `text`, `markup`, `value`, `attr` and `on` directives.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(TEXT, bind_text::<H>);
        table.register(MARKUP, bind_markup::<H>);
        table.register(VALUE, bind_value::<H>);
        table.register(ATTR, bind_attr::<H>);
        table.register(ON, bind_on::<H>);
        table
    }

    /// Add or replace the handler for `kind`; returns the one replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: DirectiveHandler<H>,
    ) -> Option<DirectiveHandler<H>> {
        self.handlers.insert(kind.into(), handler)
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<DirectiveHandler<H>> {
        self.handlers.get(kind).copied()
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H: TemplateHost> Default for DirectiveTable<H> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<H> std::fmt::Debug for DirectiveTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("DirectiveTable").field("kinds", &kinds).finish()
    }
}

// ---------------------------------------------------------------------------
// Standard handlers
// ---------------------------------------------------------------------------

fn bind_text<H: TemplateHost>(
    cx: &mut DirectiveContext<'_, H>,
    directive: &Directive<'_>,
) -> Result<(), BindError> {
    let node = directive.node;
    if !path::has_interpolation(directive.expr) {
        let value = path::get_value(directive.expr, cx.state)?;
        cx.host.set_text(node, &value.to_string());
        let host = cx.host.clone();
        cx.scope.watch(directive.expr, cx.state, move |value| {
            host.set_text(node, &value.to_string());
            Ok(())
        })?;
        return Ok(());
    }

    let template: Rc<str> = Rc::from(directive.expr);
    cx.host
        .set_text(node, &path::resolve_interpolations(&template, cx.state)?);
    for expr in path::interpolation_expressions(directive.expr) {
        let host = cx.host.clone();
        let state = cx.state.clone();
        let template = Rc::clone(&template);
        cx.scope.watch(expr, cx.state, move |_| {
            host.set_text(node, &path::resolve_interpolations(&template, &state)?);
            Ok(())
        })?;
    }
    Ok(())
}

fn bind_markup<H: TemplateHost>(
    cx: &mut DirectiveContext<'_, H>,
    directive: &Directive<'_>,
) -> Result<(), BindError> {
    let node = directive.node;
    let value = path::get_value(directive.expr, cx.state)?;
    cx.host.set_markup(node, &value.to_string());
    let host = cx.host.clone();
    cx.scope.watch(directive.expr, cx.state, move |value| {
        host.set_markup(node, &value.to_string());
        Ok(())
    })?;
    Ok(())
}

fn bind_value<H: TemplateHost>(
    cx: &mut DirectiveContext<'_, H>,
    directive: &Directive<'_>,
) -> Result<(), BindError> {
    let node = directive.node;
    let value = path::get_value(directive.expr, cx.state)?;
    cx.host.set_control_value(node, &value.to_string());
    let host = cx.host.clone();
    cx.scope.watch(directive.expr, cx.state, move |value| {
        host.set_control_value(node, &value.to_string());
        Ok(())
    })?;

    let host = cx.host.clone();
    let state = cx.state.clone();
    let expr: Rc<str> = Rc::from(directive.expr.trim());
    let on_input: EventHandler = Rc::new(move |event: &Event| -> Result<(), BindError> {
        let edited = host.read_control_value(event);
        tracing::trace!(message = "directive.value.input", node = node.index(), expr = %expr);
        path::set_value(&expr, &state, edited)?;
        Ok(())
    });
    cx.host.on_event(node, INPUT_EVENT, on_input);
    Ok(())
}

fn bind_attr<H: TemplateHost>(
    cx: &mut DirectiveContext<'_, H>,
    directive: &Directive<'_>,
) -> Result<(), BindError> {
    let name = directive.require_detail(ATTR)?;
    cx.host.set_attribute(directive.node, name, directive.expr);
    Ok(())
}

fn bind_on<H: TemplateHost>(
    cx: &mut DirectiveContext<'_, H>,
    directive: &Directive<'_>,
) -> Result<(), BindError> {
    let event = directive.require_detail(ON)?;
    let methods = Rc::clone(cx.methods);
    let method: Rc<str> = Rc::from(directive.expr.trim());
    let handler: EventHandler = Rc::new(move |fired: &Event| methods.invoke(&method, fired));
    cx.host.on_event(directive.node, event, handler);
    Ok(())
}
