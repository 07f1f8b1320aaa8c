#![forbid(unsafe_code)]

//! Weft: minimal reactive data binding.
//!
//! A [`ViewModel`] observes a JSON state tree, compiles the directives of a
//! markup subtree against it, and keeps the two in sync:
//!
//! ```
//! use serde_json::json;
//! use weft::prelude::*;
//!
//! let dom = Dom::parse(r#"<div id="app"><p>{{person.name}}-{{age}}</p><input bind-value="age"></div>"#)?;
//! let vm = ViewModel::new(
//!     dom.clone(),
//!     Options::new()
//!         .attach("#app")
//!         .state(json!({ "person": { "name": "A" }, "age": 1 })),
//! )?;
//! let p = dom.query_selector("p").unwrap();
//! assert_eq!(dom.text_content(p), "A-1");
//!
//! vm.set_path("person.name", "B")?;
//! assert_eq!(dom.text_content(p), "B-1");
//!
//! dom.input(dom.query_selector("input").unwrap(), 2)?;
//! assert_eq!(vm.get("age"), Some(Value::from(2)));
//! assert_eq!(dom.text_content(p), "B-2");
//! # Ok::<(), weft::Error>(())
//! ```
//!
//! The building blocks live in their own crates and are re-exported here:
//! [`weft_core`] (reactivity), [`weft_template`] (compiler and directives)
//! and [`weft_dom`] (the in-memory render target).

pub mod error;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod options;
pub mod vm;

pub use error::{Error, Result};
#[cfg(feature = "tracing-json")]
pub use logging::install_json_subscriber;
pub use options::{AttachTarget, Method, Options};
pub use vm::ViewModel;

pub use weft_core;
pub use weft_dom;
pub use weft_template;

/// Everything needed to build and drive a view-model.
pub mod prelude {
    pub use crate::{AttachTarget, Error, Options, ViewModel};
    pub use weft_core::{ReactiveError, Value, Watcher};
    pub use weft_dom::{Dom, NodeId};
    pub use weft_template::{BindError, Event, Syntax};
}
