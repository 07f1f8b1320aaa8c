#![forbid(unsafe_code)]

//! Markup serialization.
//!
//! Text and attribute values are escaped; raw nodes written by markup
//! bindings are emitted verbatim. Control values are live state and are
//! not serialized. Empty attribute values are written in boolean form.
//! The walk uses an explicit stack, so any tree the arena can hold
//! serializes without deep recursion.

use std::fmt::Write as _;

use weft_template::NodeId;

use crate::parse::is_void;
use crate::tree::{Arena, Content, Dom};

impl Dom {
    /// Markup of `node` including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let arena = self.inner.arena.borrow();
        let mut out = String::new();
        write_node(&arena, node, &mut out);
        out
    }

    /// Markup of the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let arena = self.inner.arena.borrow();
        let mut out = String::new();
        for child in arena.children(node) {
            write_node(&arena, *child, &mut out);
        }
        out
    }
}

enum Step<'a> {
    Enter(NodeId),
    Close(&'a str),
}

fn write_node(arena: &Arena, node: NodeId, out: &mut String) {
    let mut steps = vec![Step::Enter(node)];
    while let Some(step) = steps.pop() {
        let node = match step {
            Step::Enter(node) => node,
            Step::Close(tag) => {
                let _ = write!(out, "</{tag}>");
                continue;
            }
        };
        match arena.content(node) {
            None => {}
            Some(Content::Document | Content::Fragment) => {
                steps.extend(arena.children(node).iter().rev().map(|c| Step::Enter(*c)));
            }
            Some(Content::Text(text)) => escape_into(text, false, out),
            Some(Content::Raw(markup)) => out.push_str(markup),
            Some(Content::Element(el)) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        escape_into(value, true, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void(&el.tag) {
                    continue;
                }
                steps.push(Step::Close(&el.tag));
                steps.extend(arena.children(node).iter().rev().map(|c| Step::Enter(*c)));
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
