#![forbid(unsafe_code)]

//! Minimal HTML-like markup parser.
//!
//! Accepts elements with quoted, unquoted and boolean attributes, void
//! elements (`<input>`, `<br>`, ...), self-closing tags, comments and
//! `<!DOCTYPE>` (both skipped), and the common character entities. There
//! is no error recovery and no implied end tags: every non-void element
//! must be closed explicitly.
//!
//! # Failure Modes
//!
//! | Failure | Cause |
//! |---------|-------|
//! | [`MarkupError::UnexpectedEof`] | input ends inside a comment, tag, quoted value or open element |
//! | [`MarkupError::UnexpectedClose`] | `</x>` with nothing open |
//! | [`MarkupError::MismatchedClose`] | `</x>` while `<y>` is innermost |
//! | [`MarkupError::InvalidTagName`] | `<` not followed by a letter, `/`, or `!` |

use smallvec::SmallVec;
use weft_template::NodeId;

use crate::error::MarkupError;
use crate::tree::{Arena, Content, Dom, Element};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

impl Dom {
    /// Parse `markup` into a new document.
    ///
    /// # Errors
    ///
    /// [`MarkupError`] with the byte offset of the problem.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut arena = Arena::new();
        Parser::new(markup, &mut arena).run()?;
        tracing::trace!(message = "dom.parse", bytes = markup.len());
        Ok(Self::from_arena(arena))
    }
}

struct Parser<'a, 'b> {
    src: &'a str,
    pos: usize,
    arena: &'b mut Arena,
    /// Open elements, innermost last.
    open: SmallVec<[(NodeId, String); 16]>,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn new(src: &'a str, arena: &'b mut Arena) -> Self {
        Self {
            src,
            pos: 0,
            arena,
            open: SmallVec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn current_parent(&self) -> NodeId {
        self.open.last().map_or(NodeId::new(0), |(id, _)| *id)
    }

    fn run(mut self) -> Result<(), MarkupError> {
        while self.pos < self.src.len() {
            if self.rest().starts_with('<') {
                self.markup()?;
            } else {
                self.text();
            }
        }
        if !self.open.is_empty() {
            return Err(MarkupError::UnexpectedEof {
                offset: self.src.len(),
                context: "element",
            });
        }
        Ok(())
    }

    fn text(&mut self) {
        let end = self.rest().find('<').map_or(self.src.len(), |i| self.pos + i);
        let raw = &self.src[self.pos..end];
        self.pos = end;
        let node = self.arena.push(Content::Text(decode_entities(raw)));
        let parent = self.current_parent();
        self.arena.append(parent, node);
    }

    fn markup(&mut self) -> Result<(), MarkupError> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").ok_or(MarkupError::UnexpectedEof {
                offset: self.src.len(),
                context: "comment",
            })?;
            self.pos += 4 + end + 3;
            return Ok(());
        }
        if rest.starts_with("<!") {
            let end = rest.find('>').ok_or(MarkupError::UnexpectedEof {
                offset: self.src.len(),
                context: "declaration",
            })?;
            self.pos += end + 1;
            return Ok(());
        }
        if rest.starts_with("</") {
            return self.close_tag(start);
        }
        self.open_tag(start)
    }

    fn tag_name(&mut self) -> Result<String, MarkupError> {
        let rest = self.rest();
        let starts_alpha = rest.bytes().next().is_some_and(|b| b.is_ascii_alphabetic());
        if !starts_alpha {
            return Err(MarkupError::InvalidTagName { offset: self.pos });
        }
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        self.pos += len;
        Ok(rest[..len].to_ascii_lowercase())
    }

    fn skip_whitespace(&mut self) {
        let len = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_whitespace)
            .count();
        self.pos += len;
    }

    fn close_tag(&mut self, start: usize) -> Result<(), MarkupError> {
        self.pos += 2;
        let tag = self.tag_name()?;
        self.skip_whitespace();
        if !self.rest().starts_with('>') {
            return Err(if self.pos < self.src.len() {
                MarkupError::InvalidTagName { offset: self.pos }
            } else {
                MarkupError::UnexpectedEof {
                    offset: self.src.len(),
                    context: "closing tag",
                }
            });
        }
        self.pos += 1;
        match self.open.last() {
            None => Err(MarkupError::UnexpectedClose { tag, offset: start }),
            Some((_, expected)) if *expected != tag => Err(MarkupError::MismatchedClose {
                expected: expected.clone(),
                found: tag,
                offset: start,
            }),
            Some(_) => {
                self.open.pop();
                Ok(())
            }
        }
    }

    fn open_tag(&mut self, start: usize) -> Result<(), MarkupError> {
        self.pos += 1;
        let tag = self.tag_name()?;
        let mut element = Element::new(tag.clone());
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(MarkupError::UnexpectedEof {
                    offset: self.src.len(),
                    context: "tag",
                });
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (name, value) = self.attribute()?;
            if element.attribute(&name).is_none() {
                element.attrs.push((name, value));
            }
        }

        let node = self.arena.push(Content::Element(element));
        let parent = self.current_parent();
        self.arena.append(parent, node);
        if !self_closing && !is_void(&tag) {
            self.open.push((node, tag));
        }
        tracing::trace!(message = "dom.parse.element", offset = start, node = node.index());
        Ok(())
    }

    fn attribute(&mut self) -> Result<(String, String), MarkupError> {
        let rest = self.rest();
        let len = rest
            .bytes()
            .take_while(|b| {
                !b.is_ascii_whitespace() && !matches!(*b, b'/' | b'>' | b'=' | b'"' | b'\'')
            })
            .count();
        if len == 0 {
            return Err(MarkupError::InvalidTagName { offset: self.pos });
        }
        let name = rest[..len].to_string();
        self.pos += len;
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let value = match rest.bytes().next() {
            Some(quote @ (b'"' | b'\'')) => {
                let close = rest[1..]
                    .bytes()
                    .position(|b| b == quote)
                    .ok_or(MarkupError::UnexpectedEof {
                        offset: self.src.len(),
                        context: "attribute value",
                    })?;
                self.pos += close + 2;
                &rest[1..=close]
            }
            _ => {
                let len = rest
                    .bytes()
                    .take_while(|b| !b.is_ascii_whitespace() && *b != b'>')
                    .count();
                self.pos += len;
                &rest[..len]
            }
        };
        Ok((name, decode_entities(value)))
    }
}

/// Decode `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#39;`, `&nbsp;`
/// and numeric references. Anything else is kept literally.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
