#![forbid(unsafe_code)]

//! Template compiler: turns a static tree into live bindings.
//!
//! [`Compiler::compile`] detaches the children of the attach root into an
//! off-tree fragment, walks the fragment depth-first and reattaches it. For
//! each element every attribute is classified by the [`Syntax`]: directive
//! and event attributes are dispatched through the [`DirectiveTable`] and
//! then removed. Text nodes containing `{{ }}` go to the `text` directive.
//!
//! # Invariants
//!
//! 1. Directive and event attributes never survive a successful compile;
//!    every other attribute is left untouched.
//! 2. The staged children are restored to the root whether or not
//!    compilation succeeds.
//! 3. Children are listed after their parent is processed, so nodes created
//!    by a binding are seen by the walk; the content of an element carrying
//!    a `text` or `markup` directive belongs to that binding and is not
//!    walked.
//!
//! # Failure Modes
//!
//! The first [`BindError`] aborts the walk. Bindings created before it are
//! dropped with the partial [`BindingScope`].

use std::rc::Rc;

use weft_core::{BindingScope, Value, path};

use crate::directive::{self, Directive, DirectiveContext, DirectiveTable};
use crate::error::BindError;
use crate::host::{MethodDispatch, NodeId, NodeKind, TemplateHost};
use crate::syntax::{Marker, Syntax};

/// Counters collected during one compile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub elements: usize,
    /// Text nodes bound through interpolation.
    pub text_nodes: usize,
    pub directives: usize,
    pub events: usize,
}

/// Output of a successful compile.
#[derive(Debug)]
pub struct Compiled {
    /// Owns every watcher created by the pass.
    pub scope: BindingScope,
    pub stats: CompileStats,
}

/// Compiles templates hosted by `H`.
pub struct Compiler<H: TemplateHost> {
    host: H,
    syntax: Syntax,
    table: DirectiveTable<H>,
}

impl<H: TemplateHost> Compiler<H> {
    /// Default syntax and the standard directives.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            syntax: Syntax::default(),
            table: DirectiveTable::standard(),
        }
    }

    #[must_use]
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: DirectiveTable<H>) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn table_mut(&mut self) -> &mut DirectiveTable<H> {
        &mut self.table
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Bind every directive below `root` against `state`.
    ///
    /// # Errors
    ///
    /// The first [`BindError`] raised by a directive, or
    /// [`BindError::UnknownDirective`] for an unregistered kind.
    pub fn compile(
        &self,
        root: NodeId,
        state: &Value,
        methods: &Rc<dyn MethodDispatch>,
    ) -> Result<Compiled, BindError> {
        let _span = tracing::debug_span!("template.compile", root = root.index()).entered();

        let mut scope = BindingScope::new();
        let mut stats = CompileStats::default();
        let staged = self.host.stage_children(root);
        let result = {
            let mut cx = DirectiveContext {
                host: &self.host,
                state,
                methods,
                scope: &mut scope,
            };
            self.visit(staged, &mut cx, &mut stats)
        };
        self.host.restore_children(staged, root);

        if let Err(err) = result {
            tracing::debug!(message = "template.compile.failed", error = %err);
            return Err(err);
        }
        tracing::debug!(
            message = "template.compiled",
            elements = stats.elements,
            text_nodes = stats.text_nodes,
            directives = stats.directives,
            events = stats.events,
            bindings = scope.binding_count(),
        );
        Ok(Compiled { scope, stats })
    }

    /// Depth-first walk with an explicit stack, so template depth is bounded
    /// by memory rather than by the call stack.
    fn visit(
        &self,
        root: NodeId,
        cx: &mut DirectiveContext<'_, H>,
        stats: &mut CompileStats,
    ) -> Result<(), BindError> {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            let owns_content = match self.host.kind(node) {
                NodeKind::Element => {
                    stats.elements += 1;
                    self.compile_element(node, cx, stats)?
                }
                NodeKind::Text => {
                    let content = self.host.text(node);
                    if path::has_interpolation(&content) {
                        stats.text_nodes += 1;
                        self.dispatch(directive::TEXT, cx, node, &content, None)?;
                    }
                    false
                }
                NodeKind::Other => false,
            };
            if !owns_content {
                pending.extend(self.host.children(node).into_iter().rev());
            }
        }
        Ok(())
    }

    /// Returns whether a content directive now owns the element's children.
    fn compile_element(
        &self,
        node: NodeId,
        cx: &mut DirectiveContext<'_, H>,
        stats: &mut CompileStats,
    ) -> Result<bool, BindError> {
        let mut owns_content = false;
        for (name, value) in self.host.attributes(node) {
            match self.syntax.classify(&name) {
                Some(Marker::Directive { kind, detail }) => {
                    self.dispatch_named(&name, kind, cx, node, &value, detail)?;
                    owns_content |= kind == directive::TEXT || kind == directive::MARKUP;
                    stats.directives += 1;
                }
                Some(Marker::Event { name: event }) => {
                    let detail = Some(event).filter(|e| !e.is_empty());
                    self.dispatch_named(&name, directive::ON, cx, node, &value, detail)?;
                    stats.events += 1;
                }
                None => continue,
            }
            self.host.remove_attribute(node, &name);
        }
        Ok(owns_content)
    }

    fn dispatch_named(
        &self,
        attribute: &str,
        kind: &str,
        cx: &mut DirectiveContext<'_, H>,
        node: NodeId,
        expr: &str,
        detail: Option<&str>,
    ) -> Result<(), BindError> {
        if !self.table.contains(kind) {
            return Err(BindError::UnknownDirective {
                name: attribute.to_string(),
            });
        }
        self.dispatch(kind, cx, node, expr, detail)
    }

    fn dispatch(
        &self,
        kind: &str,
        cx: &mut DirectiveContext<'_, H>,
        node: NodeId,
        expr: &str,
        detail: Option<&str>,
    ) -> Result<(), BindError> {
        let handler = self.table.get(kind).ok_or_else(|| BindError::UnknownDirective {
            name: kind.to_string(),
        })?;
        tracing::trace!(message = "template.directive", kind, node = node.index(), expr);
        handler(cx, &Directive { node, expr, detail })
    }
}

impl<H: TemplateHost> std::fmt::Debug for Compiler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("syntax", &self.syntax)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
