#![forbid(unsafe_code)]

//! JSON log output (feature `tracing-json`).
//!
//! The library crates only emit `tracing` events; applications that want
//! structured output can install this subscriber once at startup. The
//! filter comes from `RUST_LOG`, defaulting to `weft=info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Error, Result};

/// Install a global JSON subscriber writing to stderr.
///
/// # Errors
///
/// [`Error::Logging`] when a global subscriber is already set.
pub fn install_json_subscriber() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|err| Error::Logging {
            message: err.to_string(),
        })
}
