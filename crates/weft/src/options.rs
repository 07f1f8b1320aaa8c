#![forbid(unsafe_code)]

//! View-model configuration.
//!
//! Options are built in code, or loaded from JSON for the data parts:
//!
//! ```json
//! {
//!   "attach": "#app",
//!   "state": { "person": { "name": "A" }, "age": 1 },
//!   "syntax": { "directive_prefix": "x-", "event_prefix": "on:" }
//! }
//! ```
//!
//! Every field is optional; unknown fields are rejected. Methods cannot be
//! expressed in JSON and are added with [`Options::method`].

use std::rc::Rc;

use ahash::AHashMap;
use serde::Deserialize;
use weft_dom::NodeId;
use weft_template::{BindError, Event, Syntax};

use crate::error::{Error, Result};
use crate::vm::ViewModel;

/// An event method: called with the view-model and the event.
pub type Method = Rc<dyn Fn(&ViewModel, &Event) -> std::result::Result<(), BindError>>;

/// Where the view-model compiles its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachTarget {
    /// `#id`, `.class` or a tag name, resolved against the document.
    Selector(String),
    Node(NodeId),
}

impl From<&str> for AttachTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for AttachTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<NodeId> for AttachTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Configuration consumed by [`ViewModel::new`].
#[derive(Clone)]
pub struct Options {
    pub(crate) attach: Option<AttachTarget>,
    pub(crate) state: serde_json::Value,
    pub(crate) methods: AHashMap<String, Method>,
    pub(crate) syntax: Syntax,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            attach: None,
            state: serde_json::Value::Object(serde_json::Map::new()),
            methods: AHashMap::new(),
            syntax: Syntax::default(),
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the template under `target`. Without one the state is
    /// observed but nothing is rendered.
    #[must_use]
    pub fn attach(mut self, target: impl Into<AttachTarget>) -> Self {
        self.attach = Some(target.into());
        self
    }

    /// Initial state; must be a JSON object (or null for an empty one).
    #[must_use]
    pub fn state(mut self, state: serde_json::Value) -> Self {
        self.state = state;
        self
    }

    /// Register an event method under `name`.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&ViewModel, &Event) -> std::result::Result<(), BindError> + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    #[must_use]
    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Load the attach selector, state and syntax from JSON.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for malformed JSON or unknown fields,
    /// [`Error::Bind`] for ambiguous directive prefixes.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawOptions = serde_json::from_str(json)?;
        let mut options = Self::new();
        if let Some(selector) = raw.attach {
            options = options.attach(selector);
        }
        if let Some(state) = raw.state {
            options = options.state(state);
        }
        if let Some(syntax) = raw.syntax {
            options = options.syntax(Syntax::new(syntax.directive_prefix, syntax.event_prefix)?);
        }
        tracing::debug!(message = "options.loaded", attach = ?options.attach);
        Ok(options)
    }

    #[must_use]
    pub fn attach_target(&self) -> Option<&AttachTarget> {
        self.attach.as_ref()
    }

    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The state as an object, treating null as empty.
    pub(crate) fn take_state(&mut self) -> Result<serde_json::Value> {
        match std::mem::take(&mut self.state) {
            serde_json::Value::Null => Ok(serde_json::Value::Object(serde_json::Map::new())),
            state @ serde_json::Value::Object(_) => Ok(state),
            other => Err(Error::Config {
                message: format!("state must be an object, got `{other}`"),
                source: None,
            }),
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("attach", &self.attach)
            .field("state", &self.state)
            .field("methods", &self.method_names())
            .field("syntax", &self.syntax)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    attach: Option<String>,
    #[serde(default)]
    state: Option<serde_json::Value>,
    #[serde(default)]
    syntax: Option<RawSyntax>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSyntax {
    directive_prefix: String,
    event_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_fields() {
        let options = Options::new()
            .attach("#app")
            .state(json!({ "n": 1 }))
            .method("inc", |_, _| Ok(()))
            .method("dec", |_, _| Ok(()));
        assert_eq!(options.attach_target(), Some(&AttachTarget::Selector("#app".into())));
        assert_eq!(options.method_names(), vec!["dec", "inc"]);
    }

    #[test]
    fn json_loading() {
        let options = Options::from_json_str(
            r##"{ "attach": "#app", "state": { "age": 1 }, "syntax": { "directive_prefix": "x-", "event_prefix": "on:" } }"##,
        )
        .unwrap();
        assert_eq!(options.attach_target(), Some(&AttachTarget::Selector("#app".into())));
        assert_eq!(options.state, json!({ "age": 1 }));
        assert_eq!(options.syntax.directive_prefix(), "x-");
    }

    #[test]
    fn json_defaults_and_rejections() {
        let empty = Options::from_json_str("{}").unwrap();
        assert!(empty.attach_target().is_none());
        assert_eq!(empty.state, json!({}));

        assert!(matches!(
            Options::from_json_str(r##"{ "attach": "#a", "methods": {} }"##),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            Options::from_json_str("{ not json"),
            Err(Error::Config { source: Some(_), .. })
        ));
        assert!(matches!(
            Options::from_json_str(r#"{ "syntax": { "directive_prefix": "@", "event_prefix": "@" } }"#),
            Err(Error::Bind(BindError::AmbiguousSyntax { .. }))
        ));
    }

    #[test]
    fn state_must_be_an_object() {
        let mut options = Options::new().state(json!(null));
        assert_eq!(options.take_state().unwrap(), json!({}));
        let mut options = Options::new().state(json!([1, 2]));
        assert!(matches!(options.take_state(), Err(Error::Config { source: None, .. })));
    }
}
