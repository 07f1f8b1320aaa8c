#![forbid(unsafe_code)]

//! [`RenderTarget`] and [`TemplateTree`] for [`Dom`], plus event dispatch.
//!
//! Listeners run without any borrow of the tree held, so a handler may
//! mutate the document (directly or through the bindings it triggers).
//!
//! # Failure Modes
//!
//! Render calls on a node of the wrong kind are ignored and traced at
//! `debug`. [`Dom::dispatch`] runs every listener and returns the first
//! error.

use std::rc::Rc;

use weft_core::Value;
use weft_template::{
    BindError, Event, EventHandler, INPUT_EVENT, NodeId, NodeKind, RenderTarget, TemplateTree,
};

use crate::tree::{Content, Dom, Listener};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

impl Dom {
    /// Deliver `event` with payload `value` to the listeners of `node`, in
    /// registration order.
    ///
    /// # Errors
    ///
    /// The first error returned by a listener; later listeners still run.
    pub fn dispatch(
        &self,
        node: NodeId,
        event: &str,
        value: impl Into<Value>,
    ) -> Result<(), BindError> {
        let handlers: Vec<EventHandler> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.node == node && l.event == event)
            .map(|l| Rc::clone(&l.handler))
            .collect();
        let event = Event::new(node, event, value);
        tracing::debug!(
            message = "dom.dispatch",
            node = node.index(),
            event = %event.name,
            listeners = handlers.len()
        );

        let mut first_error = None;
        for handler in handlers {
            if let Err(err) = handler(&event) {
                tracing::debug!(message = "dom.dispatch.error", event = %event.name, error = %err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Simulate a user edit: set the control value, then fire `input`.
    ///
    /// # Errors
    ///
    /// See [`Dom::dispatch`].
    pub fn input(&self, node: NodeId, value: impl Into<Value>) -> Result<(), BindError> {
        let value = value.into();
        self.set_control_value(node, &value.to_string());
        self.dispatch(node, INPUT_EVENT, value)
    }

    /// Number of listeners registered on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.node == node)
            .count()
    }

    /// Drop every listener registered on `root` or its descendants.
    pub fn clear_listeners_within(&self, root: NodeId) {
        let removed: Vec<Listener> = {
            let arena = self.inner.arena.borrow();
            let mut listeners = self.inner.listeners.borrow_mut();
            let (inside, kept): (Vec<Listener>, Vec<Listener>) = std::mem::take(&mut *listeners)
                .into_iter()
                .partition(|l| arena.is_inclusive_ancestor(root, l.node));
            *listeners = kept;
            inside
        };
        tracing::debug!(message = "dom.listeners.cleared", root = root.index(), count = removed.len());
        // Handlers own clones of this Dom.
        drop(removed);
    }
}

// ---------------------------------------------------------------------------
// RenderTarget
// ---------------------------------------------------------------------------

impl RenderTarget for Dom {
    fn set_text(&self, node: NodeId, text: &str) {
        let mut arena = self.inner.arena.borrow_mut();
        match arena.get_mut(node).map(|n| &mut n.content) {
            Some(Content::Text(existing)) => text.clone_into(existing),
            Some(Content::Element(_) | Content::Fragment | Content::Document) => {
                arena.replace_content(node, Content::Text(text.to_string()));
            }
            _ => tracing::debug!(message = "dom.set_text.ignored", node = node.index()),
        }
    }

    fn set_markup(&self, node: NodeId, markup: &str) {
        let mut arena = self.inner.arena.borrow_mut();
        match arena.get_mut(node).map(|n| &mut n.content) {
            Some(Content::Element(_) | Content::Fragment | Content::Document) => {
                arena.replace_content(node, Content::Raw(markup.to_string()));
            }
            Some(content @ (Content::Raw(_) | Content::Text(_))) => {
                *content = Content::Raw(markup.to_string());
            }
            None => tracing::debug!(message = "dom.set_markup.ignored", node = node.index()),
        }
    }

    fn set_control_value(&self, node: NodeId, value: &str) {
        match self.inner.arena.borrow_mut().element_mut(node) {
            Some(el) => el.value = Some(value.to_string()),
            None => tracing::debug!(message = "dom.set_control_value.ignored", node = node.index()),
        }
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        match self.inner.arena.borrow_mut().element_mut(node) {
            Some(el) => el.set_attribute(name, value),
            None => tracing::debug!(message = "dom.set_attribute.ignored", node = node.index()),
        }
    }

    fn on_event(&self, node: NodeId, event: &str, handler: EventHandler) {
        self.inner.listeners.borrow_mut().push(Listener {
            node,
            event: event.to_string(),
            handler,
        });
    }

    /// The event payload, or the target's current control value when the
    /// payload is null.
    fn read_control_value(&self, event: &Event) -> Value {
        if !event.value.is_null() {
            return event.value.clone();
        }
        self.control_value(event.target)
            .map_or(Value::Null, Value::from)
    }
}

// ---------------------------------------------------------------------------
// TemplateTree
// ---------------------------------------------------------------------------

impl TemplateTree for Dom {
    fn kind(&self, node: NodeId) -> NodeKind {
        match self.inner.arena.borrow().content(node) {
            Some(Content::Element(_)) => NodeKind::Element,
            Some(Content::Text(_)) => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.child_nodes(node)
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .arena
            .borrow()
            .element(node)
            .map(|el| el.attrs.clone())
            .unwrap_or_default()
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(el) = self.inner.arena.borrow_mut().element_mut(node) {
            el.remove_attribute(name);
        }
    }

    fn text(&self, node: NodeId) -> String {
        match self.inner.arena.borrow().content(node) {
            Some(Content::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    fn stage_children(&self, node: NodeId) -> NodeId {
        let mut arena = self.inner.arena.borrow_mut();
        let fragment = arena.push(Content::Fragment);
        for child in arena.children(node).to_vec() {
            arena.append(fragment, child);
        }
        fragment
    }

    fn restore_children(&self, staged: NodeId, node: NodeId) {
        let mut arena = self.inner.arena.borrow_mut();
        for child in arena.children(staged).to_vec() {
            arena.append(node, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(dom: &Dom, node: NodeId, event: &str, tag: &'static str) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        dom.on_event(
            node,
            event,
            Rc::new(move |e: &Event| {
                sink.borrow_mut().push(format!("{tag}:{}", e.value));
                Ok(())
            }),
        );
        log
    }

    #[test]
    fn set_text_reuses_text_child() {
        let dom = Dom::parse("<p>old</p>").unwrap();
        let p = dom.query_selector("p").unwrap();
        dom.set_text(p, "one");
        let count = dom.node_count();
        dom.set_text(p, "two");
        assert_eq!(dom.node_count(), count);
        assert_eq!(dom.inner_html(p), "two");
    }

    #[test]
    fn set_text_replaces_mixed_children() {
        let dom = Dom::parse("<p>a<b>b</b></p>").unwrap();
        let p = dom.query_selector("p").unwrap();
        dom.set_text(p, "<x>");
        assert_eq!(dom.inner_html(p), "&lt;x&gt;");
    }

    #[test]
    fn set_markup_is_raw() {
        let dom = Dom::parse("<div></div>").unwrap();
        let div = dom.query_selector("div").unwrap();
        dom.set_markup(div, "<em>hi</em>");
        assert_eq!(dom.outer_html(div), "<div><em>hi</em></div>");
        dom.set_text(div, "plain");
        assert_eq!(dom.outer_html(div), "<div>plain</div>");
    }

    #[test]
    fn listeners_run_in_order_and_first_error_wins() {
        let dom = Dom::parse("<button></button>").unwrap();
        let b = dom.query_selector("button").unwrap();
        let first = recorder(&dom, b, "click", "a");
        dom.on_event(
            b,
            "click",
            Rc::new(|_: &Event| {
                Err(BindError::MissingHandler {
                    name: "gone".into(),
                })
            }),
        );
        let third = recorder(&dom, b, "click", "c");

        let err = dom.dispatch(b, "click", 1).unwrap_err();
        assert_eq!(err, BindError::MissingHandler { name: "gone".into() });
        assert_eq!(*first.borrow(), vec!["a:1".to_string()]);
        assert_eq!(*third.borrow(), vec!["c:1".to_string()]);
        assert!(dom.dispatch(b, "keyup", Value::Null).is_ok());
    }

    #[test]
    fn input_sets_value_then_fires() {
        let dom = Dom::parse("<input>").unwrap();
        let input = dom.query_selector("input").unwrap();
        let seen = recorder(&dom, input, INPUT_EVENT, "in");
        dom.input(input, "typed").unwrap();
        assert_eq!(dom.control_value(input).as_deref(), Some("typed"));
        assert_eq!(*seen.borrow(), vec!["in:typed".to_string()]);
    }

    #[test]
    fn read_control_value_falls_back_to_control() {
        let dom = Dom::parse("<input>").unwrap();
        let input = dom.query_selector("input").unwrap();
        dom.set_control_value(input, "kept");
        let event = Event::new(input, INPUT_EVENT, Value::Null);
        assert_eq!(dom.read_control_value(&event), Value::from("kept"));
    }

    #[test]
    fn handler_may_mutate_the_dom() {
        let dom = Dom::parse("<button></button><p></p>").unwrap();
        let b = dom.query_selector("button").unwrap();
        let p = dom.query_selector("p").unwrap();
        let handle = dom.clone();
        dom.on_event(
            b,
            "click",
            Rc::new(move |_: &Event| {
                handle.set_text(p, "clicked");
                Ok(())
            }),
        );
        dom.dispatch(b, "click", Value::Null).unwrap();
        assert_eq!(dom.text_content(p), "clicked");
    }

    #[test]
    fn clear_listeners_within_subtree_only() {
        let dom = Dom::parse("<div id=\"a\"><button></button></div><button id=\"b\"></button>").unwrap();
        let inner = dom.query_selector_within(dom.query_selector("#a").unwrap(), "button").unwrap();
        let outer = dom.query_selector("#b").unwrap();
        let _x = recorder(&dom, inner, "click", "x");
        let _y = recorder(&dom, outer, "click", "y");

        dom.clear_listeners_within(dom.query_selector("#a").unwrap());
        assert_eq!(dom.listener_count(inner), 0);
        assert_eq!(dom.listener_count(outer), 1);
    }

    #[test]
    #[tracing_test::traced_test]
    fn dispatch_is_logged() {
        let dom = Dom::parse("<button></button>").unwrap();
        let b = dom.query_selector("button").unwrap();
        dom.dispatch(b, "click", Value::Null).unwrap();
        assert!(logs_contain("dom.dispatch"));
    }

    #[test]
    fn staging_round_trip_preserves_order() {
        let dom = Dom::parse("<div><a></a><b></b></div>").unwrap();
        let div = dom.query_selector("div").unwrap();
        let before = dom.child_nodes(div);
        let staged = dom.stage_children(div);
        assert!(dom.child_nodes(div).is_empty());
        assert_eq!(dom.parent(before[0]), Some(staged));
        dom.restore_children(staged, div);
        assert_eq!(dom.child_nodes(div), before);
    }
}
