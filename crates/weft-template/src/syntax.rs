#![forbid(unsafe_code)]

//! Recognizing directive and event attributes.
//!
//! With the default [`Syntax`], `bind-<kind>` and `bind-<kind>:<detail>`
//! are directives and `@<event>` is shorthand for `bind-on:<event>`.
//! Attributes matching neither prefix are left alone.

use crate::error::BindError;

/// A framework-private attribute, split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    /// `bind-<kind>[:<detail>]`
    Directive {
        kind: &'a str,
        detail: Option<&'a str>,
    },
    /// `@<event>`
    Event { name: &'a str },
}

/// Attribute prefixes for directives and event shorthands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    directive_prefix: String,
    event_prefix: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            directive_prefix: "bind-".to_string(),
            event_prefix: "@".to_string(),
        }
    }
}

impl Syntax {
    /// Custom prefixes.
    ///
    /// # Errors
    ///
    /// [`BindError::AmbiguousSyntax`] when a prefix is empty or one prefix
    /// starts with the other.
    pub fn new(
        directive_prefix: impl Into<String>,
        event_prefix: impl Into<String>,
    ) -> Result<Self, BindError> {
        let directive_prefix = directive_prefix.into();
        let event_prefix = event_prefix.into();
        if directive_prefix.is_empty()
            || event_prefix.is_empty()
            || directive_prefix.starts_with(&event_prefix)
            || event_prefix.starts_with(&directive_prefix)
        {
            return Err(BindError::AmbiguousSyntax {
                directive_prefix,
                event_prefix,
            });
        }
        Ok(Self {
            directive_prefix,
            event_prefix,
        })
    }

    #[must_use]
    pub fn directive_prefix(&self) -> &str {
        &self.directive_prefix
    }

    #[must_use]
    pub fn event_prefix(&self) -> &str {
        &self.event_prefix
    }

    /// Classify an attribute name, or `None` for ordinary attributes.
    #[must_use]
    pub fn classify<'a>(&self, attribute: &'a str) -> Option<Marker<'a>> {
        if let Some(rest) = attribute.strip_prefix(self.directive_prefix.as_str()) {
            let (kind, detail) = match rest.split_once(':') {
                Some((kind, detail)) => (kind, Some(detail).filter(|d| !d.is_empty())),
                None => (rest, None),
            };
            return Some(Marker::Directive { kind, detail });
        }
        attribute
            .strip_prefix(self.event_prefix.as_str())
            .map(|name| Marker::Event { name })
    }
}
