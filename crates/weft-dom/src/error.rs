#![forbid(unsafe_code)]

//! Markup parse errors. Offsets are byte positions in the input.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// Input ended inside a comment, tag, quoted value or open element.
    #[error("unexpected end of input at byte {offset} inside {context}")]
    UnexpectedEof { offset: usize, context: &'static str },
    /// A closing tag with no element left to close.
    #[error("closing tag `</{tag}>` at byte {offset} has no open element")]
    UnexpectedClose { tag: String, offset: usize },
    /// A closing tag that does not match the innermost open element.
    #[error("closing tag `</{found}>` at byte {offset} does not match `<{expected}>`")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },
    /// `<` followed by something that is not a tag name.
    #[error("invalid tag name at byte {offset}")]
    InvalidTagName { offset: usize },
}
