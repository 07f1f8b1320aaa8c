#![forbid(unsafe_code)]

//! Arena-backed node tree.
//!
//! Nodes are never freed: detaching a node only unlinks it, and its
//! [`NodeId`] stays valid for the lifetime of the [`Dom`]. Content
//! bindings update an existing single text or raw child in place, so
//! repeated renders do not grow the arena.
//!
//! # Invariants
//!
//! 1. Node 0 is the document and has no parent.
//! 2. `parent(c) == Some(p)` exactly when `c` is in `children(p)`.
//! 3. A node appears in at most one child list.

use std::cell::RefCell;
use std::rc::Rc;

use weft_template::{EventHandler, NodeId};

/// The payload of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Document,
    /// Off-tree container used while staging.
    Fragment,
    Element(Element),
    Text(String),
    /// Markup inserted verbatim by a markup binding.
    Raw(String),
}

/// An element and its current control value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Live value of form controls; not serialized.
    pub value: Option<String>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            value: None,
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => value.clone_into(&mut slot.1),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) content: Content,
}

/// Node storage, borrowed as a whole.
#[derive(Debug)]
pub(crate) struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                content: Content::Document,
            }],
        }
    }

    pub(crate) fn push(&mut self, content: Content) -> NodeId {
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            content,
        });
        NodeId::new(self.nodes.len() - 1)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn content(&self, id: NodeId) -> Option<&Content> {
        self.get(id).map(|n| &n.content)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        match self.content(id) {
            Some(Content::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.get_mut(id).map(|n| &mut n.content) {
            Some(Content::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    /// Appending a node to itself or to one of its descendants is ignored.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let Some(child_node) = self.get(child) else {
            return;
        };
        // A childless node can only be its own ancestor.
        let creates_cycle = if child_node.children.is_empty() {
            child == parent
        } else {
            self.is_inclusive_ancestor(child, parent)
        };
        if self.get(parent).is_none() || creates_cycle {
            return;
        }
        self.detach(child);
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
    }

    pub(crate) fn clear_children(&mut self, id: NodeId) {
        let children = self
            .get_mut(id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// `root` and its descendants in document order.
    pub(crate) fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Replace the children of `id` with a single node of the given
    /// content, reusing an existing lone child of the same variant.
    pub(crate) fn replace_content(&mut self, id: NodeId, content: Content) {
        let lone = match self.children(id) {
            [only] => Some(*only),
            _ => None,
        };
        if let Some(existing) = lone.and_then(|only| self.get_mut(only)) {
            if std::mem::discriminant(&existing.content) == std::mem::discriminant(&content) {
                existing.content = content;
                return;
            }
        }
        self.clear_children(id);
        let child = self.push(content);
        self.append(id, child);
    }
}

pub(crate) struct Listener {
    pub(crate) node: NodeId,
    pub(crate) event: String,
    pub(crate) handler: EventHandler,
}

pub(crate) struct DomInner {
    pub(crate) arena: RefCell<Arena>,
    pub(crate) listeners: RefCell<Vec<Listener>>,
}

/// Shared handle to one document.
///
/// Clones refer to the same tree. Event listeners registered by bindings
/// hold clones of the handle; [`Dom::clear_listeners_within`] releases
/// them.
#[derive(Clone)]
pub struct Dom {
    pub(crate) inner: Rc<DomInner>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::from_arena(Arena::new())
    }

    pub(crate) fn from_arena(arena: Arena) -> Self {
        Self {
            inner: Rc::new(DomInner {
                arena: RefCell::new(arena),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The document node.
    #[must_use]
    pub fn document(&self) -> NodeId {
        NodeId::new(0)
    }

    #[must_use]
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner
            .arena
            .borrow_mut()
            .push(Content::Element(Element::new(tag.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner
            .arena
            .borrow_mut()
            .push(Content::Text(text.to_string()))
    }

    #[must_use]
    pub fn create_fragment(&self) -> NodeId {
        self.inner.arena.borrow_mut().push(Content::Fragment)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.inner.arena.borrow_mut().append(parent, child);
    }

    /// Unlink `node` from its parent.
    pub fn detach(&self, node: NodeId) {
        self.inner.arena.borrow_mut().detach(node);
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.arena.borrow().get(node).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.arena.borrow().children(node).to_vec()
    }

    /// A copy of the node's payload.
    #[must_use]
    pub fn content(&self, node: NodeId) -> Option<Content> {
        self.inner.arena.borrow().content(node).cloned()
    }

    #[must_use]
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner
            .arena
            .borrow()
            .element(node)
            .map(|el| el.tag.clone())
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .arena
            .borrow()
            .element(node)
            .and_then(|el| el.attribute(name).map(str::to_string))
    }

    #[must_use]
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// The live value of a form control, if one was ever set.
    #[must_use]
    pub fn control_value(&self, node: NodeId) -> Option<String> {
        self.inner
            .arena
            .borrow()
            .element(node)
            .and_then(|el| el.value.clone())
    }

    /// Concatenated text of `node` and its descendants; raw markup is
    /// included as written.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let arena = self.inner.arena.borrow();
        arena
            .descendants(node)
            .into_iter()
            .filter_map(|id| match arena.content(id) {
                Some(Content::Text(t) | Content::Raw(t)) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of nodes ever created, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.arena.borrow().nodes.len()
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.node_count())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_moves_between_parents() {
        let dom = Dom::new();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        let t = dom.create_text("x");
        dom.append_child(a, t);
        dom.append_child(b, t);
        assert!(dom.child_nodes(a).is_empty());
        assert_eq!(dom.child_nodes(b), vec![t]);
        assert_eq!(dom.parent(t), Some(b));
    }

    #[test]
    fn cannot_append_ancestor_into_descendant() {
        let dom = Dom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("span");
        dom.append_child(outer, inner);
        dom.append_child(inner, outer);
        assert_eq!(dom.parent(outer), None);
        assert_eq!(dom.child_nodes(inner), Vec::<NodeId>::new());

        let leaf = dom.create_element("i");
        dom.append_child(leaf, leaf);
        assert_eq!(dom.parent(leaf), None);
    }

    #[test]
    fn replace_content_reuses_lone_child() {
        let dom = Dom::new();
        let p = dom.create_element("p");
        {
            let mut arena = dom.inner.arena.borrow_mut();
            arena.replace_content(p, Content::Text("a".into()));
            arena.replace_content(p, Content::Text("b".into()));
        }
        let before = dom.node_count();
        dom.inner
            .arena
            .borrow_mut()
            .replace_content(p, Content::Text("c".into()));
        assert_eq!(dom.node_count(), before);
        assert_eq!(dom.text_content(p), "c");
    }

    #[test]
    fn text_content_concatenates_in_order() {
        let dom = Dom::new();
        let p = dom.create_element("p");
        let b = dom.create_element("b");
        let t1 = dom.create_text("one ");
        let t2 = dom.create_text("two");
        let t3 = dom.create_text(" three");
        dom.append_child(p, t1);
        dom.append_child(p, b);
        dom.append_child(b, t2);
        dom.append_child(p, t3);
        assert_eq!(dom.text_content(p), "one two three");
    }

    #[test]
    fn element_attribute_helpers() {
        let mut el = Element::new("a");
        el.set_attribute("class", "x  y");
        el.set_attribute("href", "/");
        el.set_attribute("class", "z");
        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["z"]);
        el.remove_attribute("href");
        assert_eq!(el.attribute("href"), None);
    }
}
