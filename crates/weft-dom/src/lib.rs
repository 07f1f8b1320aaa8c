#![forbid(unsafe_code)]

//! In-memory markup tree used as a Weft render target.
//!
//! [`Dom`] is a small arena-backed document with just enough of a browser
//! DOM to host bindings: parse markup, find the attach root with a simple
//! selector, let the template compiler walk and rewrite it, and deliver
//! events to the listeners the bindings register.
//!
//! ```
//! use weft_dom::Dom;
//!
//! let dom = Dom::parse("<div id=\"app\"><p>{{ msg }}</p></div>").unwrap();
//! let app = dom.query_selector("#app").unwrap();
//! assert_eq!(dom.inner_html(app), "<p>{{ msg }}</p>");
//! ```

pub mod error;
pub mod host;
pub mod parse;
pub mod select;
pub mod serialize;
pub mod tree;

pub use error::MarkupError;
pub use parse::{VOID_ELEMENTS, decode_entities, is_void};
pub use select::Selector;
pub use tree::{Content, Dom, Element};
pub use weft_template::NodeId;
