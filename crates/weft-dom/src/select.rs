#![forbid(unsafe_code)]

//! Single simple selectors: `#id`, `.class`, or a tag name.

use weft_template::NodeId;

use crate::tree::{Dom, Element};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
}

impl Selector {
    /// `None` when `text` is empty or contains characters outside a simple
    /// selector.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let valid = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        };
        if let Some(id) = text.strip_prefix('#') {
            valid(id).then(|| Self::Id(id.to_string()))
        } else if let Some(class) = text.strip_prefix('.') {
            valid(class).then(|| Self::Class(class.to_string()))
        } else {
            valid(text).then(|| Self::Tag(text.to_ascii_lowercase()))
        }
    }

    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Id(id) => element.attribute("id") == Some(id.as_str()),
            Self::Class(class) => element.classes().any(|c| c == class.as_str()),
            Self::Tag(tag) => element.tag == *tag,
        }
    }
}

impl Dom {
    /// First element below the document matching `selector`, in document
    /// order.
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_within(self.document(), selector)
    }

    /// First element below `root` (inclusive) matching `selector`.
    #[must_use]
    pub fn query_selector_within(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all_within(root, selector).into_iter().next()
    }

    /// Every element below the document matching `selector`.
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_selector_all_within(self.document(), selector)
    }

    fn query_selector_all_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        let arena = self.inner.arena.borrow();
        arena
            .descendants(root)
            .into_iter()
            .filter(|id| arena.element(*id).is_some_and(|el| selector.matches(el)))
            .collect()
    }
}
