#![forbid(unsafe_code)]

//! Top-level error type.

use thiserror::Error;
use weft_core::ReactiveError;
use weft_dom::MarkupError;
use weft_template::BindError;

#[derive(Debug, Error)]
pub enum Error {
    /// Template compilation or a bound event failed.
    #[error(transparent)]
    Bind(#[from] BindError),
    /// A state path could not be resolved or written.
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
    #[error(transparent)]
    Markup(#[from] MarkupError),
    /// The attach selector matched nothing.
    #[error("attach target `{selector}` matched no element")]
    AttachTargetNotFound { selector: String },
    /// Options could not be loaded.
    #[error("invalid options: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
    /// A global log subscriber could not be installed.
    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Config {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
