//! In-memory host used by the unit tests of this crate.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use weft_core::Value;

use crate::error::BindError;
use crate::host::{
    Event, EventHandler, MethodDispatch, NodeId, NodeKind, RenderTarget, TemplateTree,
};

#[derive(Default)]
struct Node {
    kind: Option<NodeKind>,
    children: Vec<NodeId>,
    attrs: Vec<(String, String)>,
    text: String,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    calls: Vec<String>,
    texts: Vec<String>,
    listeners: Vec<(NodeId, String, EventHandler)>,
}

/// Records every render call; node 0 is an element root.
#[derive(Clone)]
pub(crate) struct RecordingHost {
    inner: Rc<RefCell<Inner>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        let host = Self {
            inner: Rc::new(RefCell::new(Inner::default())),
        };
        host.push(NodeKind::Element, String::new());
        host
    }
}

impl RecordingHost {
    fn push(&self, kind: NodeKind, text: String) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        inner.nodes.push(Node {
            kind: Some(kind),
            text,
            ..Node::default()
        });
        NodeId::new(inner.nodes.len() - 1)
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        self.inner.borrow_mut().nodes[parent.index()].children.push(child);
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub(crate) fn element(&self, parent: NodeId, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.push(NodeKind::Element, String::new());
        self.inner.borrow_mut().nodes[id.index()].attrs = attrs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.append(parent, id);
        id
    }

    pub(crate) fn text_node(&self, parent: NodeId, content: &str) -> NodeId {
        let id = self.push(NodeKind::Text, content.to_string());
        self.append(parent, id);
        id
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.inner.borrow().texts.clone()
    }

    pub(crate) fn fire(&self, node: NodeId, name: &str, value: Value) -> Result<(), BindError> {
        let handlers: Vec<EventHandler> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(n, e, _)| *n == node && e == name)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();
        let event = Event::new(node, name, value);
        handlers.iter().try_for_each(|h| h(&event))
    }

    fn record(&self, call: String) {
        self.inner.borrow_mut().calls.push(call);
    }
}

impl RenderTarget for RecordingHost {
    fn set_text(&self, node: NodeId, text: &str) {
        self.record(format!("text {node} {text}"));
        let mut inner = self.inner.borrow_mut();
        inner.texts.push(text.to_string());
        if let Some(n) = inner.nodes.get_mut(node.index()) {
            n.text = text.to_string();
        }
    }

    fn set_markup(&self, node: NodeId, markup: &str) {
        self.record(format!("markup {node} {markup}"));
    }

    fn set_control_value(&self, node: NodeId, value: &str) {
        self.record(format!("value {node} {value}"));
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.record(format!("attr {node} {name}={value}"));
        let mut inner = self.inner.borrow_mut();
        if let Some(n) = inner.nodes.get_mut(node.index()) {
            match n.attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => n.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn on_event(&self, node: NodeId, event: &str, handler: EventHandler) {
        self.record(format!("listen {node} {event}"));
        self.inner
            .borrow_mut()
            .listeners
            .push((node, event.to_string(), handler));
    }

    fn read_control_value(&self, event: &Event) -> Value {
        event.value.clone()
    }
}

impl TemplateTree for RecordingHost {
    fn kind(&self, node: NodeId) -> NodeKind {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(|n| n.kind)
            .unwrap_or(NodeKind::Other)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.borrow().nodes[node.index()].children.clone()
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner.borrow().nodes[node.index()].attrs.clone()
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.inner.borrow_mut().nodes[node.index()]
            .attrs
            .retain(|(k, _)| k != name);
    }

    fn text(&self, node: NodeId) -> String {
        self.inner.borrow().nodes[node.index()].text.clone()
    }

    fn stage_children(&self, node: NodeId) -> NodeId {
        let staged = self.push(NodeKind::Other, String::new());
        let mut inner = self.inner.borrow_mut();
        let children = std::mem::take(&mut inner.nodes[node.index()].children);
        inner.nodes[staged.index()].children = children;
        staged
    }

    fn restore_children(&self, staged: NodeId, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        let children = std::mem::take(&mut inner.nodes[staged.index()].children);
        inner.nodes[node.index()].children.extend(children);
    }
}

/// Knows a fixed set of method names and records invocations.
pub(crate) struct RecordingMethods {
    known: AHashMap<String, RefCell<usize>>,
}

impl RecordingMethods {
    pub(crate) fn with(names: &[&str]) -> Self {
        Self {
            known: names
                .iter()
                .map(|n| ((*n).to_string(), RefCell::new(0)))
                .collect(),
        }
    }
}

impl MethodDispatch for RecordingMethods {
    fn invoke(&self, name: &str, _event: &Event) -> Result<(), BindError> {
        let count = self.known.get(name).ok_or_else(|| BindError::MissingHandler {
            name: name.to_string(),
        })?;
        *count.borrow_mut() += 1;
        Ok(())
    }
}
